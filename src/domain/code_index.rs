//! Sorted code index used for parent resolution and code lookups.

use std::cmp::Ordering;

use generational_arena::{Arena, Index};
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::domain::arena::RegionNode;
use crate::domain::error::{DomainError, DomainResult};

/// Node indices ordered by `(code, input position)`.
///
/// Codes compare bytewise. Ties between duplicate codes are broken by input
/// position, and lookups return the lowest position, so the first occurrence
/// of a duplicated code always wins regardless of how the index was built.
#[derive(Debug, Clone, Default)]
pub struct CodeIndex {
    entries: Vec<Index>,
}

fn compare(arena: &Arena<RegionNode>, a: Index, b: Index) -> Ordering {
    match (arena.get(a), arena.get(b)) {
        (Some(x), Some(y)) => x
            .data
            .code
            .as_bytes()
            .cmp(y.data.code.as_bytes())
            .then(x.position.cmp(&y.position)),
        _ => Ordering::Equal,
    }
}

impl CodeIndex {
    /// Sort `indices` by code. Fails only if the index cannot be allocated.
    #[instrument(level = "debug", skip(arena, indices), fields(n = indices.len()))]
    pub(crate) fn build(arena: &Arena<RegionNode>, indices: Vec<Index>) -> DomainResult<Self> {
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(indices.len())
            .map_err(|e| DomainError::ResourceExhausted(format!("code index: {e}")))?;
        entries.extend(indices);
        entries.par_sort_unstable_by(|&a, &b| compare(arena, a, b));
        debug!("code index sorted: {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Binary search for `code`, returning the first matching entry.
    pub fn lookup(&self, arena: &Arena<RegionNode>, code: &str) -> Option<Index> {
        let pos = self.entries.partition_point(|&idx| {
            arena
                .get(idx)
                .map(|node| node.data.code.as_bytes() < code.as_bytes())
                .unwrap_or(false)
        });
        self.entries
            .get(pos)
            .copied()
            .filter(|&idx| arena.get(idx).is_some_and(|node| node.data.code == code))
    }

    /// Runs of entries sharing one code, each run in input order.
    pub(crate) fn code_groups<'a>(
        &'a self,
        arena: &'a Arena<RegionNode>,
    ) -> impl Iterator<Item = &'a [Index]> + 'a {
        self.entries
            .chunk_by(move |&a, &b| match (arena.get(a), arena.get(b)) {
                (Some(x), Some(y)) => x.data.code == y.data.code,
                _ => false,
            })
    }

    /// Codes occurring more than once, sorted and de-duplicated.
    pub fn duplicate_codes(&self, arena: &Arena<RegionNode>) -> Vec<String> {
        self.code_groups(arena)
            .filter(|group| group.len() > 1)
            .filter_map(|group| arena.get(group[0]))
            .map(|node| node.data.code.clone())
            .collect()
    }

    /// Drop entries whose node is no longer in the arena. Order is preserved.
    pub(crate) fn retain_live(&mut self, arena: &Arena<RegionNode>) {
        self.entries.retain(|&idx| arena.contains(idx));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Level, Region};

    fn arena_of(codes: &[&str]) -> (Arena<RegionNode>, Vec<Index>) {
        let mut arena = Arena::new();
        let indices = codes
            .iter()
            .enumerate()
            .map(|(pos, code)| {
                let region = Region::new(*code, format!("r{pos}"), Level::County, "0", 0);
                arena.insert(RegionNode::new(region, Some(pos)))
            })
            .collect();
        (arena, indices)
    }

    #[test]
    fn given_unsorted_codes_when_looking_up_then_finds_each() {
        let (arena, indices) = arena_of(&["300000000000", "100000000000", "200000000000"]);
        let index = CodeIndex::build(&arena, indices.clone()).unwrap();

        assert_eq!(index.lookup(&arena, "100000000000"), Some(indices[1]));
        assert_eq!(index.lookup(&arena, "300000000000"), Some(indices[0]));
        assert_eq!(index.lookup(&arena, "999999999999"), None);
        assert_eq!(index.lookup(&arena, "0"), None);
    }

    #[test]
    fn given_duplicate_codes_when_looking_up_then_first_input_occurrence_wins() {
        let (arena, indices) = arena_of(&[
            "500000000000",
            "200000000000",
            "500000000000",
            "500000000000",
        ]);
        let index = CodeIndex::build(&arena, indices.clone()).unwrap();

        assert_eq!(index.lookup(&arena, "500000000000"), Some(indices[0]));
        assert_eq!(index.duplicate_codes(&arena), vec!["500000000000".to_string()]);
    }

    #[test]
    fn given_removed_node_when_retaining_then_lookup_skips_it() {
        let (mut arena, indices) = arena_of(&["500000000000", "500000000000"]);
        let mut index = CodeIndex::build(&arena, indices.clone()).unwrap();

        arena.remove(indices[0]);
        index.retain_live(&arena);

        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup(&arena, "500000000000"), Some(indices[1]));
    }
}
