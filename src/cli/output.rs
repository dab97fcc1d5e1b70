//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use itertools::Itertools;

use crate::application::services::{NameSearch, RegionView};
use crate::domain::{Extension, Region};

const SEPARATOR: &str = "----------------------------------------";

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print plain output (no color)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

fn extension_lines(region: &Region) -> (String, String) {
    match &region.extension {
        Some(Extension::HousePrice(price)) => (format!("{:.2}", price), "no data".to_string()),
        Some(Extension::EmploymentRate(rate)) => ("no data".to_string(), rate.clone()),
        None => ("no data".to_string(), "no data".to_string()),
    }
}

/// Render one region with its hierarchy, nearest ancestor first.
pub fn render_view(view: &RegionView) -> String {
    let region = &view.region;
    let (price, rate) = extension_lines(region);
    let chain = std::iter::once(region.name.as_str())
        .chain(view.ancestry.iter().map(|a| a.name.as_str()))
        .join(" <- ");

    let mut out = String::new();
    out.push_str(&format!("{}: {}\n", "Name".bold(), region.name));
    out.push_str(&format!("{}: {}\n", "Code".bold(), region.code));
    out.push_str(&format!("{}: {}\n", "Level".bold(), region.level));
    out.push_str(&format!("{}: {}\n", "Type".bold(), region.kind));
    out.push_str(&format!("{}: {}\n", "Avg house price".bold(), price));
    out.push_str(&format!("{}: {}\n", "Employment rate".bold(), rate));
    out.push_str(&format!("{}: {}\n", "Hierarchy".bold(), chain));
    for ancestor in &view.ancestry {
        out.push_str(&format!(
            "   └─ {} {}\n",
            ancestor.level.label().dimmed(),
            ancestor.name
        ));
    }
    out
}

/// Render a code lookup result.
pub fn render_lookup(code: &str, view: Option<&RegionView>) -> String {
    match view {
        Some(view) => render_view(view),
        None => format!("No region with code {}\n", code.yellow()),
    }
}

/// Render name search results separated by rules, with a count and truncation note.
pub fn render_search(term: &str, search: &NameSearch, limit: usize) -> String {
    if search.matches.is_empty() {
        let mut out = format!("No region name contains '{}'\n", term.yellow());
        if search.truncated {
            out.push_str(&format!(
                "{}\n",
                "(matches exist, but the result limit is 0)".dimmed()
            ));
        }
        return out;
    }

    let mut out = search
        .matches
        .iter()
        .map(render_view)
        .join(&format!("{}\n", SEPARATOR));
    out.push_str(&format!("\n{} match(es)\n", search.matches.len()));
    if search.truncated {
        out.push_str(&format!(
            "{}\n",
            format!("Too many results, showing the first {}", limit).yellow()
        ));
    }
    out
}
