//! Domain layer: entities, tree index and queries
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod code_index;
pub mod entities;
pub mod error;
pub mod query;
pub mod tree_traits;

pub use arena::{RegionNode, RegionTree};
pub use builder::{BuildOutcome, BuildReport, Orphan, TreeBuilder};
pub use code_index::CodeIndex;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use query::{NameMatches, QueryEngine};
pub use tree_traits::TreeNodeConvert;
