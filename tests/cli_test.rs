//! Tests for the interactive menu and CLI argument surface

use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use regiontree::application::services::{LoadOptions, RegionService};
use regiontree::cli::args::{Cli, Commands};
use regiontree::cli::commands::render_stats;
use regiontree::cli::run_repl;
use regiontree::infrastructure::traits::RealFileSystem;
use regiontree::util::testing::sample_csv;

fn session(script: &str, limit: usize) -> String {
    let catalog = RegionService::new(Arc::new(RealFileSystem), LoadOptions::default())
        .open_str(&sample_csv(), Path::new("sample.csv"))
        .unwrap();
    let mut out = Vec::new();
    run_repl(&catalog, limit, script.as_bytes(), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn given_name_search_over_limit_when_in_repl_then_notes_truncation() {
    let text = session("2\n区\n3\n", 2);
    assert!(text.contains("2 match(es)"));
    assert!(text.contains("showing the first 2"));
}

#[test]
fn given_empty_name_when_in_repl_then_reports_and_continues() {
    let text = session("2\n\n1\n120000000000\n", 5);
    assert!(text.contains("region name must not be empty"));
    assert!(text.contains("天津市"));
}

#[test]
fn given_end_of_input_when_in_repl_then_session_ends() {
    let text = session("", 5);
    assert!(text.contains("1) code"));
}

#[test]
fn given_sample_when_rendering_stats_then_shows_depth() {
    let catalog = RegionService::new(Arc::new(RealFileSystem), LoadOptions::default())
        .open_str(&sample_csv(), Path::new("sample.csv"))
        .unwrap();
    let text = render_stats(&catalog);
    assert!(text.contains("Tree depth:      6"));
    assert!(text.contains("Leaves:          3"));
}

#[test]
fn given_name_command_when_parsing_then_limit_is_optional() {
    let cli = Cli::try_parse_from(["regiontree", "-f", "x.csv", "name", "东城"]).unwrap();
    match cli.command {
        Some(Commands::Name { term, limit }) => {
            assert_eq!(term, "东城");
            assert_eq!(limit, None);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn given_tree_all_with_depth_when_parsing_then_conflict() {
    let result = Cli::try_parse_from(["regiontree", "tree", "--all", "--depth", "2"]);
    assert!(result.is_err());
}
