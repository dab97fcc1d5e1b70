//! Service container for dependency injection
//!
//! Wires up services with their dependencies.

use std::sync::Arc;

use crate::application::services::{LoadOptions, RegionService};
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding application settings and services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
        }
    }

    /// Region service configured from settings.
    pub fn region_service(&self) -> RegionService {
        RegionService::new(Arc::clone(&self.fs), LoadOptions::from(self.settings.as_ref()))
    }
}
