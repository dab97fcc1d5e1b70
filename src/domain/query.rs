//! Read-only queries over a built [`RegionTree`].
//!
//! Ancestry chains are ordered nearest-ancestor-first: immediate parent,
//! then grandparent, up to the top-level region. Reverse the result for a
//! root-first path.

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::RegionTree;
use crate::domain::entities::{validate_code_with, validate_name, CODE_LENGTH};
use crate::domain::error::{DomainError, DomainResult};

/// Result of a bounded name search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMatches {
    /// Matching nodes in pre-order, at most `limit` of them
    pub nodes: Vec<Index>,
    /// True if at least one further match exists beyond the limit
    pub truncated: bool,
}

impl NameMatches {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Query engine borrowing an immutable tree. Cheap to create; any number of
/// engines may run on different threads over the same tree.
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'t> {
    tree: &'t RegionTree,
    code_length: Option<usize>,
}

impl<'t> QueryEngine<'t> {
    pub fn new(tree: &'t RegionTree) -> Self {
        Self {
            tree,
            code_length: Some(CODE_LENGTH),
        }
    }

    /// Required digit count for code queries; None accepts any digit string.
    pub fn with_code_length(mut self, code_length: Option<usize>) -> Self {
        self.code_length = code_length;
        self
    }

    pub fn tree(&self) -> &'t RegionTree {
        self.tree
    }

    /// Exact lookup by code.
    ///
    /// Uses the tree's code index when present, otherwise a full traversal;
    /// both resolve duplicate codes to the first occurrence in input order.
    #[instrument(level = "debug", skip(self))]
    pub fn find_by_code(&self, code: &str) -> DomainResult<Option<Index>> {
        let code = validate_code_with(code, self.code_length)?;
        let found = match self.tree.code_index() {
            Some(index) => index.lookup(self.tree.arena(), code),
            None => self.scan_for_code(code),
        };
        debug!("find_by_code {}: {:?}", code, found);
        Ok(found)
    }

    fn scan_for_code(&self, code: &str) -> Option<Index> {
        let root = self.tree.root();
        self.tree
            .iter()
            .filter(|(idx, node)| *idx != root && node.data.code == code)
            .min_by_key(|(_, node)| node.position)
            .map(|(idx, _)| idx)
    }

    /// Case-sensitive substring search over region names in pre-order.
    ///
    /// Collects at most `limit` matches. Traversal ends at the first match
    /// past the limit, which sets `truncated`. The synthetic root is never
    /// a match.
    #[instrument(level = "debug", skip(self))]
    pub fn find_by_name(&self, term: &str, limit: usize) -> DomainResult<NameMatches> {
        let term = validate_name(term)?;
        let root = self.tree.root();
        let mut matches = NameMatches::default();

        for (idx, node) in self.tree.iter() {
            if idx == root || !node.data.name.contains(term) {
                continue;
            }
            if matches.nodes.len() == limit {
                matches.truncated = true;
                break;
            }
            matches.nodes.push(idx);
        }

        debug!(
            "find_by_name '{}': {} matches, truncated={}",
            term,
            matches.nodes.len(),
            matches.truncated
        );
        Ok(matches)
    }

    /// Ancestors of `idx`, nearest first, synthetic root excluded.
    pub fn ancestry_chain(&self, idx: Index) -> DomainResult<Vec<Index>> {
        self.walk_ancestry(idx, false)
    }

    /// Like [`ancestry_chain`](Self::ancestry_chain) but ending with the synthetic root.
    pub fn ancestry_chain_with_root(&self, idx: Index) -> DomainResult<Vec<Index>> {
        self.walk_ancestry(idx, true)
    }

    fn walk_ancestry(&self, idx: Index, include_root: bool) -> DomainResult<Vec<Index>> {
        let start = self.tree.get(idx).ok_or(DomainError::UnknownNode)?;
        let root = self.tree.root();
        let max_steps = self.tree.len();
        let mut chain = Vec::new();
        let mut current = start.parent;

        while let Some(parent) = current {
            if parent == root && !include_root {
                break;
            }
            if chain.len() >= max_steps {
                return Err(DomainError::CycleDetected(start.data.code.clone()));
            }
            let node = self
                .tree
                .get(parent)
                .ok_or_else(|| DomainError::DanglingReference(start.data.code.clone()))?;
            chain.push(parent);
            current = node.parent;
        }
        Ok(chain)
    }
}
