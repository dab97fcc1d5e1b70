//! Tree builder for turning a flat list of regions into a rooted hierarchy.

use generational_arena::{Arena, Index};
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::domain::arena::{RegionNode, RegionTree};
use crate::domain::code_index::CodeIndex;
use crate::domain::entities::Region;
use crate::domain::error::{DomainError, DomainResult};

/// Capacity of a child list on its first append; it doubles from there.
const INITIAL_CHILD_CAPACITY: usize = 10;

/// Result type for tree operations.
pub type TreeResult<T> = DomainResult<T>;

/// A record whose parent code did not resolve to any known code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orphan {
    /// Position in the build input
    pub position: usize,
    pub code: String,
    pub parent_code: String,
}

/// Structural anomalies collected while building.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Records with an unresolvable parent code
    pub orphans: Vec<Orphan>,
    /// Codes of records that resolved a parent but cannot reach the root
    /// (descendants of orphans, members of parent cycles, later copies of a
    /// code whose first copy is left out)
    pub detached: Vec<String>,
    /// Codes present more than once in the input
    pub duplicate_codes: Vec<String>,
    /// Records reachable from the synthetic root
    pub attached: usize,
}

impl BuildReport {
    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty() && self.detached.is_empty() && self.duplicate_codes.is_empty()
    }
}

/// A published tree together with its build report.
#[derive(Debug)]
pub struct BuildOutcome {
    pub tree: RegionTree,
    pub report: BuildReport,
}

/// Constructs a [`RegionTree`] from validated regions.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    retain_code_index: bool,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            retain_code_index: true,
        }
    }

    /// Keep the sorted code index in the tree for O(log N) lookups.
    pub fn retain_code_index(mut self, retain: bool) -> Self {
        self.retain_code_index = retain;
        self
    }

    /// Build a tree from `regions`.
    ///
    /// Parents are resolved through a code index sorted once up front.
    /// Child order under each parent follows input order. Orphans and
    /// anything that cannot reach the root are left out of the tree and
    /// listed in the [`BuildReport`]; they never fail the build. A code
    /// always names its first record in input order. The tree is
    /// only returned once fully built.
    #[instrument(level = "debug", skip(self, regions))]
    pub fn build<I>(&self, regions: I) -> TreeResult<BuildOutcome>
    where
        I: IntoIterator<Item = Region>,
    {
        let regions: Vec<Region> = regions.into_iter().collect();
        let n = regions.len();
        info!("building region tree from {} records", n);

        // One node per record, input order preserved
        let mut arena: Arena<RegionNode> = Arena::with_capacity(n + 1);
        let mut nodes: Vec<Index> = Vec::new();
        nodes
            .try_reserve_exact(n)
            .map_err(|e| DomainError::ResourceExhausted(format!("node list: {e}")))?;
        for (position, region) in regions.into_iter().enumerate() {
            nodes.push(arena.insert(RegionNode::new(region, Some(position))));
        }

        let mut index = CodeIndex::build(&arena, nodes.clone())?;
        let duplicate_codes = index.duplicate_codes(&arena);
        if !duplicate_codes.is_empty() {
            warn!(
                "{} duplicated codes, first occurrence wins",
                duplicate_codes.len()
            );
        }

        let root = arena.insert(RegionNode::new(Region::synthetic_root(), None));

        // Parent resolution only reads the arena and the sorted index
        let parents: Vec<Option<Index>> = nodes
            .par_iter()
            .map(|&idx| {
                let region = &arena[idx].data;
                if region.is_top_level() {
                    Some(root)
                } else {
                    index.lookup(&arena, &region.parent_code)
                }
            })
            .collect();

        let mut orphans = Vec::new();
        for (position, (&child, parent)) in nodes.iter().zip(parents).enumerate() {
            match parent {
                Some(parent) => attach(&mut arena, parent, child)?,
                None => {
                    let region = &arena[child].data;
                    debug!(
                        "orphan at {}: {} (parent {})",
                        position, region.code, region.parent_code
                    );
                    orphans.push(Orphan {
                        position,
                        code: region.code.clone(),
                        parent_code: region.parent_code.clone(),
                    });
                }
            }
        }

        let detached = prune_unreachable(&mut arena, root, &nodes, &orphans, &index);
        let attached = arena.len() - 1;

        let code_index = if self.retain_code_index {
            index.retain_live(&arena);
            Some(index)
        } else {
            None
        };

        if !orphans.is_empty() || !detached.is_empty() {
            warn!(
                "{} orphans, {} detached records left out of tree",
                orphans.len(),
                detached.len()
            );
        }
        info!("region tree built: {} of {} records attached", attached, n);

        Ok(BuildOutcome {
            tree: RegionTree::from_parts(arena, root, code_index),
            report: BuildReport {
                orphans,
                detached,
                duplicate_codes,
                attached,
            },
        })
    }
}

/// Append `child` to `parent`'s child list and set the back-reference.
fn attach(arena: &mut Arena<RegionNode>, parent: Index, child: Index) -> TreeResult<()> {
    let parent_node = arena
        .get_mut(parent)
        .ok_or(DomainError::UnknownNode)?;
    let children = &mut parent_node.children;
    if children.len() == children.capacity() {
        let additional = children.len().max(INITIAL_CHILD_CAPACITY);
        children
            .try_reserve_exact(additional)
            .map_err(|e| DomainError::ResourceExhausted(format!("child list: {e}")))?;
    }
    children.push(child);

    if let Some(child_node) = arena.get_mut(child) {
        child_node.parent = Some(parent);
    }
    Ok(())
}

/// Remove every node not reachable from `root`. Returns the codes of removed
/// nodes that were not orphans themselves.
///
/// A duplicated code belongs to its first occurrence. When that occurrence is
/// unreachable, later occurrences are removed as well, so parent resolution
/// and code lookups never disagree about which record a code names.
fn prune_unreachable(
    arena: &mut Arena<RegionNode>,
    root: Index,
    nodes: &[Index],
    orphans: &[Orphan],
    index: &CodeIndex,
) -> Vec<String> {
    let mut reachable = vec![false; nodes.len()];
    let mut stack = vec![root];
    while let Some(idx) = stack.pop() {
        let Some(node) = arena.get(idx) else {
            continue;
        };
        if let Some(position) = node.position {
            if reachable[position] {
                continue;
            }
            reachable[position] = true;
        }
        stack.extend(node.children.iter().copied());
    }

    let position_of =
        |arena: &Arena<RegionNode>, idx: Index| arena.get(idx).and_then(|n| n.position);
    let mut shadowed = Vec::new();
    for group in index.code_groups(arena) {
        let Some((&first, later)) = group.split_first() else {
            continue;
        };
        if position_of(arena, first).is_some_and(|p| reachable[p]) {
            continue;
        }
        for &idx in later {
            if let Some(p) = position_of(arena, idx) {
                if reachable[p] {
                    reachable[p] = false;
                    shadowed.push(idx);
                }
            }
        }
    }
    // Later occurrences never receive children; only their own parent link needs cutting
    for idx in shadowed {
        if let Some(parent) = arena.get(idx).and_then(|n| n.parent) {
            if let Some(parent_node) = arena.get_mut(parent) {
                parent_node.children.retain(|&child| child != idx);
            }
        }
    }

    let mut is_orphan = vec![false; nodes.len()];
    for orphan in orphans {
        is_orphan[orphan.position] = true;
    }

    let mut detached = Vec::new();
    for (position, &idx) in nodes.iter().enumerate() {
        if reachable[position] {
            continue;
        }
        if let Some(node) = arena.remove(idx) {
            if !is_orphan[position] {
                detached.push(node.data.code);
            }
        }
    }
    detached
}
