//! regiontree: an in-memory index of administrative divisions.
//!
//! Regions are loaded from CSV, linked into a rooted arena tree and queried
//! by exact code, by name substring and by ancestry.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
