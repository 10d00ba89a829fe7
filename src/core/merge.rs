//! Deep merge for dry-run previews.
//!
//! Shows what the store will hold once new secrets are written on top of the
//! existing ones.

use crate::core::tree::{SecretLeaf, SecretNode, SecretTree};

/// Merge `new` over `existing`.
///
/// Keys present on one side only are taken as-is. Two subtrees are merged
/// recursively. Two leaves are merged key by key: values from `new` win and
/// keys only present in `existing` are kept. When a leaf meets a subtree the
/// `new` side wins.
pub fn deep_merge(new: &SecretTree, existing: &SecretTree) -> SecretTree {
    let mut merged = existing.clone();

    for (segment, node) in new {
        let combined = match (node, existing.get(segment)) {
            (SecretNode::Subtree(n), Some(SecretNode::Subtree(e))) => {
                SecretNode::Subtree(deep_merge(n, e))
            }
            (SecretNode::Leaf(n), Some(SecretNode::Leaf(e))) => SecretNode::Leaf(merge_leaf(n, e)),
            (node, _) => node.clone(),
        };
        merged.insert(segment.clone(), combined);
    }

    merged
}

fn merge_leaf(new: &SecretLeaf, existing: &SecretLeaf) -> SecretLeaf {
    let mut merged = existing.clone();
    merged.extend(new.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
