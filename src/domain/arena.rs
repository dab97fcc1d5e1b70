use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::code_index::CodeIndex;
use crate::domain::entities::Region;
use crate::domain::error::DomainResult;

/// Tree node in the arena-based region hierarchy.
#[derive(Debug)]
pub struct RegionNode {
    /// Region record wrapped by this node
    pub data: Region,
    /// Position of the record in the build input, None for the synthetic root
    pub position: Option<usize>,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in attachment order
    pub children: Vec<Index>,
}

impl RegionNode {
    pub(crate) fn new(data: Region, position: Option<usize>) -> Self {
        Self {
            data,
            position,
            parent: None,
            children: Vec::new(),
        }
    }
}

impl fmt::Display for RegionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data)
    }
}

/// Arena-based region tree, immutable once built.
///
/// All nodes live in one generational arena and reference each other by
/// [`Index`]. Dropping the tree releases every node at once.
/// The optional [`CodeIndex`] is kept from the build for O(log N) code lookups;
/// without it, lookups fall back to a full traversal.
#[derive(Debug)]
pub struct RegionTree {
    arena: Arena<RegionNode>,
    root: Index,
    code_index: Option<CodeIndex>,
}

impl RegionTree {
    pub(crate) fn from_parts(
        arena: Arena<RegionNode>,
        root: Index,
        code_index: Option<CodeIndex>,
    ) -> Self {
        Self {
            arena,
            root,
            code_index,
        }
    }

    /// Index of the synthetic root.
    pub fn root(&self) -> Index {
        self.root
    }

    pub fn get(&self, idx: Index) -> Option<&RegionNode> {
        self.arena.get(idx)
    }

    pub fn region(&self, idx: Index) -> Option<&Region> {
        self.arena.get(idx).map(|node| &node.data)
    }

    pub fn parent(&self, idx: Index) -> Option<Index> {
        self.arena.get(idx).and_then(|node| node.parent)
    }

    /// Children of `idx` in attachment order; empty for unknown indices.
    pub fn children(&self, idx: Index) -> &[Index] {
        self.arena
            .get(idx)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, idx: Index) -> bool {
        self.arena.contains(idx)
    }

    /// Number of nodes including the synthetic root.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Number of real regions (synthetic root excluded).
    pub fn region_count(&self) -> usize {
        self.arena.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.region_count() == 0
    }

    pub fn code_index(&self) -> Option<&CodeIndex> {
        self.code_index.as_ref()
    }

    /// Rebuild the sorted code index if it was not retained from the build.
    #[instrument(level = "debug", skip(self))]
    pub fn with_code_index(mut self) -> DomainResult<Self> {
        if self.code_index.is_none() {
            let indices: Vec<Index> = self
                .iter()
                .map(|(idx, _)| idx)
                .filter(|&idx| idx != self.root)
                .collect();
            self.code_index = Some(CodeIndex::build(&self.arena, indices)?);
        }
        Ok(self)
    }

    /// Drop the code index; lookups will traverse the tree.
    pub fn without_code_index(mut self) -> Self {
        self.code_index = None;
        self
    }

    pub(crate) fn arena(&self) -> &Arena<RegionNode> {
        &self.arena
    }

    /// Pre-order traversal from the root, children in stored order.
    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, self.root)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Number of levels in the tree, counting the synthetic root as one.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 1usize)];

        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for &child in self.children(idx) {
                stack.push((child, depth + 1));
            }
        }
        max_depth
    }

    /// Distance from the synthetic root (root = 0, provinces = 1).
    ///
    /// Bounded by the node count, so a corrupted parent chain yields None.
    pub fn depth_of(&self, idx: Index) -> Option<usize> {
        let mut current = self.arena.get(idx)?;
        let mut depth = 0;
        while let Some(parent) = current.parent {
            depth += 1;
            if depth > self.arena.len() {
                return None;
            }
            current = self.arena.get(parent)?;
        }
        Some(depth)
    }

    /// Number of real regions without children.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_count(&self) -> usize {
        self.iter()
            .filter(|(idx, node)| *idx != self.root && node.children.is_empty())
            .count()
    }
}

pub struct TreeIterator<'a> {
    tree: &'a RegionTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a RegionTree, start: Index) -> Self {
        let mut stack = Vec::new();
        if tree.contains(start) {
            stack.push(start);
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a RegionNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a RegionTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a RegionTree) -> Self {
        Self {
            tree,
            stack: vec![(tree.root(), false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a RegionNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
