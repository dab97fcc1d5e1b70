//! Command dispatch

use std::io::{self, BufRead, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use colored::Colorize;
use tracing::{debug, instrument};

use crate::application::services::RegionCatalog;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let cwd = std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?;
    let mut settings = Settings::load(Some(&cwd))?;
    if let Some(file) = &cli.file {
        settings.data_file = file.clone();
    }
    debug!("settings: {:?}", settings);

    match &cli.command {
        Some(Commands::Code { code }) => _code(&settings, code),
        Some(Commands::Name { term, limit }) => {
            _name(&settings, term, limit.unwrap_or(settings.name_limit))
        }
        Some(Commands::Tree { code, depth, all }) => {
            _tree(&settings, code.as_deref(), (!*all).then_some(*depth))
        }
        Some(Commands::Stats) => _stats(&settings),
        Some(Commands::Repl) | None => _repl(&settings),
        Some(Commands::Config { command }) => _config(&settings, &cwd, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn open_catalog(settings: &Settings) -> CliResult<RegionCatalog> {
    let container = ServiceContainer::new(settings.clone());
    let catalog = container.region_service().open(&settings.data_file)?;
    let report = catalog.report();
    if !report.orphans.is_empty() {
        output::warning(&format!(
            "{} record(s) with unknown parent were left out",
            report.orphan_count()
        ));
    }
    if !catalog.rejected().is_empty() {
        output::warning(&format!(
            "{} malformed line(s) skipped",
            catalog.rejected().len()
        ));
    }
    Ok(catalog)
}

#[instrument(skip(settings))]
fn _code(settings: &Settings, code: &str) -> CliResult<()> {
    let catalog = open_catalog(settings)?;
    let view = catalog.lookup_code(code)?;
    print!("{}", output::render_lookup(code, view.as_ref()));
    Ok(())
}

#[instrument(skip(settings))]
fn _name(settings: &Settings, term: &str, limit: usize) -> CliResult<()> {
    let catalog = open_catalog(settings)?;
    let search = catalog.search_name(term, limit)?;
    print!("{}", output::render_search(term, &search, limit));
    Ok(())
}

#[instrument(skip(settings))]
fn _tree(settings: &Settings, code: Option<&str>, depth: Option<usize>) -> CliResult<()> {
    let catalog = open_catalog(settings)?;
    match catalog.subtree(code, depth)? {
        Some(tree) => print!("{}", tree),
        None => output::info(&format!(
            "No region with code {}",
            code.unwrap_or_default().yellow()
        )),
    }
    Ok(())
}

fn _stats(settings: &Settings) -> CliResult<()> {
    let catalog = open_catalog(settings)?;
    print!("{}", render_stats(&catalog));
    Ok(())
}

/// Summary of a loaded catalog.
pub fn render_stats(catalog: &RegionCatalog) -> String {
    let tree = catalog.tree();
    let report = catalog.report();
    let mut out = String::new();
    out.push_str(&format!("Source:          {}\n", catalog.source().display()));
    out.push_str(&format!("Records loaded:  {}\n", catalog.record_count()));
    out.push_str(&format!("Lines rejected:  {}\n", catalog.rejected().len()));
    out.push_str(&format!("Regions in tree: {}\n", tree.region_count()));
    out.push_str(&format!("Tree depth:      {}\n", tree.depth()));
    out.push_str(&format!("Leaves:          {}\n", tree.leaf_count()));
    out.push_str(&format!("Orphans:         {}\n", report.orphan_count()));
    out.push_str(&format!("Detached:        {}\n", report.detached.len()));
    out.push_str(&format!(
        "Duplicate codes: {}\n",
        report.duplicate_codes.len()
    ));
    out.push_str(&format!(
        "Code index:      {}\n",
        if tree.code_index().is_some() {
            "retained"
        } else {
            "released"
        }
    ));
    for orphan in report.orphans.iter().take(10) {
        out.push_str(&format!(
            "  orphan {} (parent {} not found)\n",
            orphan.code, orphan.parent_code
        ));
    }
    out
}

fn _repl(settings: &Settings) -> CliResult<()> {
    let catalog = open_catalog(settings)?;
    output::header(&format!(
        "{} regions loaded from {}",
        catalog.tree().region_count(),
        catalog.source().display()
    ));
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_repl(&catalog, settings.name_limit, stdin.lock(), stdout.lock())
}

/// Interactive menu: 1 looks up a code, 2 searches names, 3 quits.
///
/// Invalid queries print an error and return to the menu. End of input quits.
pub fn run_repl<R: BufRead, W: Write>(
    catalog: &RegionCatalog,
    name_limit: usize,
    mut input: R,
    mut out: W,
) -> CliResult<()> {
    let io_err = InfraError::Terminal;

    loop {
        write!(out, "\n1) code  2) name  3) quit\n> ").map_err(io_err)?;
        out.flush().map_err(io_err)?;
        let Some(choice) = read_trimmed(&mut input).map_err(io_err)? else {
            return Ok(());
        };

        match choice.as_str() {
            "1" => {
                write!(out, "code: ").map_err(io_err)?;
                out.flush().map_err(io_err)?;
                let Some(code) = read_trimmed(&mut input).map_err(io_err)? else {
                    return Ok(());
                };
                let written = match catalog.lookup_code(&code) {
                    Ok(view) => write!(out, "{}", output::render_lookup(&code, view.as_ref())),
                    Err(ApplicationError::Domain(e)) if e.is_validation() => {
                        writeln!(out, "{}: {}", "error".red(), e)
                    }
                    Err(e) => return Err(CliError::from(e)),
                };
                written.map_err(io_err)?;
            }
            "2" => {
                write!(out, "name: ").map_err(io_err)?;
                out.flush().map_err(io_err)?;
                let Some(term) = read_trimmed(&mut input).map_err(io_err)? else {
                    return Ok(());
                };
                let written = match catalog.search_name(&term, name_limit) {
                    Ok(search) => {
                        write!(out, "{}", output::render_search(&term, &search, name_limit))
                    }
                    Err(ApplicationError::Domain(e)) if e.is_validation() => {
                        writeln!(out, "{}: {}", "error".red(), e)
                    }
                    Err(e) => return Err(CliError::from(e)),
                };
                written.map_err(io_err)?;
            }
            "3" | "q" | "quit" => return Ok(()),
            other => writeln!(out, "unknown choice '{}'", other).map_err(io_err)?,
        }
    }
}

fn read_trimmed<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn _config(settings: &Settings, cwd: &Path, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            print!("{}", settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unavailable)".to_string());
            output::info(&format!("global: {}", global));
            output::info(&format!("local:  {}", local_config_path(cwd).display()));
            output::info(&format!("data:   {}", display_data_file(&settings.data_file)));
        }
    }
    Ok(())
}

fn display_data_file(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (missing)", path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::application::services::{LoadOptions, RegionService};
    use crate::infrastructure::traits::RealFileSystem;

    const DATA: &str = "110000000000,北京市,1,0,0
110100000000,市辖区,2,110000000000,0
110101000000,东城区,3,110100000000,111,98000.5
110102000000,西城区,3,110100000000,111
";

    fn catalog() -> RegionCatalog {
        RegionService::new(Arc::new(RealFileSystem), LoadOptions::default())
            .open_str(DATA, Path::new("memory.csv"))
            .unwrap()
    }

    fn run(script: &str) -> String {
        let mut out = Vec::new();
        run_repl(&catalog(), 5, script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn given_code_choice_when_running_repl_then_prints_hierarchy() {
        let text = run("1\n110101000000\n3\n");
        assert!(text.contains("东城区 <- 市辖区 <- 北京市"));
        assert!(text.contains("98000.50"));
    }

    #[test]
    fn given_invalid_code_when_running_repl_then_reports_and_continues() {
        let text = run("1\n11ab\n2\n西城\n");
        assert!(text.contains("invalid region code '11ab'"));
        assert!(text.contains("西城区 <- 市辖区 <- 北京市"));
    }

    #[test]
    fn given_unknown_choice_when_running_repl_then_asks_again() {
        let text = run("9\nq\n");
        assert!(text.contains("unknown choice '9'"));
    }

    #[test]
    fn given_catalog_when_rendering_stats_then_counts_regions() {
        let text = render_stats(&catalog());
        assert!(text.contains("Regions in tree: 4"));
        assert!(text.contains("Orphans:         0"));
        assert!(text.contains("retained"));
    }
}
