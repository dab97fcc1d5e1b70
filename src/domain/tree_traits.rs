use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::RegionTree;

/// Conversion of a region subtree into a printable `termtree::Tree`.
pub trait TreeNodeConvert {
    /// Render the subtree below `from`, at most `max_depth` levels below it
    /// (None renders everything).
    fn to_tree_string(&self, from: Index, max_depth: Option<usize>) -> Tree<String>;
}

fn label(tree: &RegionTree, idx: Index) -> String {
    tree.region(idx)
        .map(|r| format!("{} ({})", r.name, r.code))
        .unwrap_or_else(|| "?".to_string())
}

impl TreeNodeConvert for RegionTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, from: Index, max_depth: Option<usize>) -> Tree<String> {
        if !self.contains(from) {
            return Tree::new("Empty tree".to_string());
        }

        fn build_tree(
            tree: &RegionTree,
            node_idx: Index,
            remaining: Option<usize>,
            parent_tree: &mut Tree<String>,
        ) {
            if remaining == Some(0) {
                return;
            }
            for &child_idx in tree.children(node_idx) {
                let mut child_tree = Tree::new(label(tree, child_idx));
                build_tree(tree, child_idx, remaining.map(|r| r - 1), &mut child_tree);
                parent_tree.push(child_tree);
            }
        }

        let mut root = Tree::new(label(self, from));
        build_tree(self, from, max_depth, &mut root);
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::TreeBuilder;
    use crate::domain::entities::{Level, Region};

    #[test]
    fn given_depth_limit_when_rendering_then_stops_below_limit() {
        let tree = TreeBuilder::new()
            .build(vec![
                Region::new("110000000000", "北京市", Level::Province, "0", 0),
                Region::new("110100000000", "市辖区", Level::Prefecture, "110000000000", 0),
            ])
            .unwrap()
            .tree;

        let shallow = tree.to_tree_string(tree.root(), Some(1)).to_string();
        assert!(shallow.contains("北京市 (110000000000)"));
        assert!(!shallow.contains("市辖区"));

        let full = tree.to_tree_string(tree.root(), None).to_string();
        assert!(full.contains("市辖区 (110100000000)"));
    }
}
