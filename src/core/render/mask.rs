//! Value masking.

use serde_json::Value;

use crate::core::constants::MASK_CHAR;
use crate::core::tree::{stringify, SecretNode, SecretTree};

/// Mask a single value.
///
/// The result is `min(len, mask_length)` mask characters, where `len` is the
/// character count of the stringified value. A negative `mask_length`
/// returns the value unchanged.
pub fn mask_value(value: &Value, mask_length: i64) -> Value {
    let Ok(limit) = usize::try_from(mask_length) else {
        return value.clone();
    };

    let len = stringify(value).chars().count().min(limit);
    Value::String(MASK_CHAR.to_string().repeat(len))
}

/// Mask every leaf value in the tree, in place.
pub fn mask_tree(tree: &mut SecretTree, mask_length: i64) {
    if mask_length < 0 {
        return;
    }

    for (_, node) in tree.iter_mut() {
        match node {
            SecretNode::Subtree(subtree) => mask_tree(subtree, mask_length),
            SecretNode::Leaf(leaf) => {
                for value in leaf.values_mut() {
                    *value = mask_value(value, mask_length);
                }
            }
        }
    }
}
