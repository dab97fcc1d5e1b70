//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/regiontree/regiontree.toml`
//! 3. Local config: `<dir>/.regiontree.toml` (usually the working directory)
//! 4. Environment variables: `REGIONTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::CODE_LENGTH;

/// Unified configuration for regiontree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Region CSV file (default: area_code_2024_new.csv)
    pub data_file: PathBuf,
    /// Maximum number of name search results
    pub name_limit: usize,
    /// Keep the sorted code index after building
    pub retain_code_index: bool,
    /// Maximum number of records read from the data file
    pub max_records: usize,
    /// Digits per region code; 0 accepts codes of any length
    pub code_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("area_code_2024_new.csv"),
            name_limit: 5,
            retain_code_index: true,
            max_records: 700_000,
            code_length: CODE_LENGTH,
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_file: Option<PathBuf>,
    pub name_limit: Option<usize>,
    pub retain_code_index: Option<bool>,
    pub max_records: Option<usize>,
    pub code_length: Option<usize>,
}

/// Get the XDG config directory for regiontree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "regiontree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("regiontree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".regiontree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// Required code length as used by the loader and queries.
    pub fn code_length(&self) -> Option<usize> {
        (self.code_length > 0).then_some(self.code_length)
    }

    /// Merge overlay config onto self: overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_file: overlay
                .data_file
                .clone()
                .unwrap_or_else(|| self.data_file.clone()),
            name_limit: overlay.name_limit.unwrap_or(self.name_limit),
            retain_code_index: overlay
                .retain_code_index
                .unwrap_or(self.retain_code_index),
            max_records: overlay.max_records.unwrap_or(self.max_records),
            code_length: overlay.code_length.unwrap_or(self.code_length),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.regiontree.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("global config: {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("local config: {}", local_path.display());
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.data_file = expand_path(&current.data_file);

        Ok(current)
    }

    /// Apply REGIONTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("REGIONTREE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_file") {
            settings.data_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_int("name_limit") {
            settings.name_limit = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("name_limit must not be negative: {val}"),
            })?;
        }
        if let Ok(val) = config.get_bool("retain_code_index") {
            settings.retain_code_index = val;
        }
        if let Ok(val) = config.get_int("max_records") {
            settings.max_records = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("max_records must not be negative: {val}"),
            })?;
        }
        if let Ok(val) = config.get_int("code_length") {
            settings.code_length = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("code_length must not be negative: {val}"),
            })?;
        }

        Ok(settings)
    }

    /// Render settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_partial_overlay_when_merging_then_keeps_unspecified_values() {
        let base = Settings::default();
        let overlay = RawSettings {
            name_limit: Some(10),
            ..Default::default()
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.name_limit, 10);
        assert_eq!(merged.data_file, base.data_file);
        assert!(merged.retain_code_index);
    }

    #[test]
    fn given_zero_code_length_then_any_length_is_accepted() {
        let settings = Settings {
            code_length: 0,
            ..Default::default()
        };
        assert_eq!(settings.code_length(), None);
        assert_eq!(Settings::default().code_length(), Some(12));
    }

    #[test]
    fn given_settings_when_rendering_toml_then_round_trips() {
        let settings = Settings::default();
        let text = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
