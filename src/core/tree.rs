//! Secret tree model.
//!
//! A [`SecretTree`] maps path segments to [`SecretNode`]s. A node is either a
//! subtree (more path segments below it) or a leaf holding the key/value pairs
//! stored at that path. The split is decided once, when the tree is built from
//! parsed input, so the rest of the code never has to guess.

use serde::Serialize;
use serde_json::Value;
use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::core::path;
use crate::core::types::{SecretKey, SecretPath};
use crate::error::TreeError;

/// Key/value pairs stored at a single path.
pub type SecretLeaf = BTreeMap<SecretKey, Value>;

/// Leaves addressed by their full slash-delimited path.
pub type FlatSecretSet = BTreeMap<SecretPath, SecretLeaf>;

/// A node in a secret tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SecretNode {
    /// Key/value pairs stored at this path.
    Leaf(SecretLeaf),
    /// Further path segments.
    Subtree(SecretTree),
}

impl SecretNode {
    /// Whether this node holds secret values.
    pub fn is_leaf(&self) -> bool {
        matches!(self, SecretNode::Leaf(_))
    }

    /// The leaf contents, if this is a leaf.
    pub fn as_leaf(&self) -> Option<&SecretLeaf> {
        match self {
            SecretNode::Leaf(leaf) => Some(leaf),
            SecretNode::Subtree(_) => None,
        }
    }

    /// The subtree, if this is not a leaf.
    pub fn as_subtree(&self) -> Option<&SecretTree> {
        match self {
            SecretNode::Subtree(tree) => Some(tree),
            SecretNode::Leaf(_) => None,
        }
    }

    fn from_value(path: &str, value: Value) -> Result<Self, TreeError> {
        let map = match value {
            Value::Object(map) => map,
            _ => return Err(TreeError::malformed(path, "expected a mapping")),
        };

        let nested = map.values().filter(|v| v.is_object()).count();

        if map.is_empty() || nested == 0 {
            return Ok(SecretNode::Leaf(map.into_iter().collect()));
        }

        if nested != map.len() {
            return Err(TreeError::malformed(
                path,
                "mixes nested paths and secret values",
            ));
        }

        let mut tree = SecretTree::new();
        for (segment, child) in map {
            let child_path = path::join([path, segment.as_str()]);
            tree.insert(segment, SecretNode::from_value(&child_path, child)?);
        }
        Ok(SecretNode::Subtree(tree))
    }

    fn to_value(&self) -> Value {
        match self {
            SecretNode::Leaf(leaf) => Value::Object(
                leaf.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            SecretNode::Subtree(tree) => tree.to_value(),
        }
    }
}

/// A nested tree of secrets keyed by path segment.
///
/// Children are kept in a `BTreeMap`, so iteration, serialization and
/// equality are all independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SecretTree {
    nodes: BTreeMap<String, SecretNode>,
}

impl SecretTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a parsed JSON/YAML document.
    ///
    /// The top level must be a mapping of paths. Every mapping below it is
    /// classified as a subtree when all of its children are mappings, or as a
    /// leaf when none are. An empty mapping is an empty leaf.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Malformed` for a non-mapping document, a secret
    /// value outside of any path, or a mapping that mixes both kinds.
    pub fn from_value(value: Value) -> Result<Self, TreeError> {
        let map = match value {
            Value::Object(map) => map,
            _ => {
                return Err(TreeError::malformed(
                    "",
                    "expected a mapping of paths at the top level",
                ))
            }
        };

        let mut tree = SecretTree::new();
        for (segment, value) in map {
            if !value.is_object() {
                return Err(TreeError::malformed(
                    segment,
                    "secret value outside of any path",
                ));
            }
            let node = SecretNode::from_value(&segment, value)?;
            tree.insert(segment, node);
        }
        Ok(tree)
    }

    /// Convert the tree back to a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.nodes
                .iter()
                .map(|(k, node)| (k.clone(), node.to_value()))
                .collect(),
        )
    }

    /// Insert a node, returning the previous one at that segment.
    pub fn insert(&mut self, segment: impl Into<String>, node: SecretNode) -> Option<SecretNode> {
        self.nodes.insert(segment.into(), node)
    }

    /// Look up a direct child.
    pub fn get(&self, segment: &str) -> Option<&SecretNode> {
        self.nodes.get(segment)
    }

    /// Remove a direct child.
    pub fn remove(&mut self, segment: &str) -> Option<SecretNode> {
        self.nodes.remove(segment)
    }

    /// Direct children in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, SecretNode> {
        self.nodes.iter()
    }

    /// Mutable access to direct children in key order.
    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, String, SecretNode> {
        self.nodes.iter_mut()
    }

    /// Direct child segments in key order.
    pub fn keys(&self) -> btree_map::Keys<'_, String, SecretNode> {
        self.nodes.keys()
    }

    pub(crate) fn entry(&mut self, segment: String) -> btree_map::Entry<'_, String, SecretNode> {
        self.nodes.entry(segment)
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of leaves anywhere in the tree.
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .values()
            .map(|node| match node {
                SecretNode::Leaf(_) => 1,
                SecretNode::Subtree(tree) => tree.leaf_count(),
            })
            .sum()
    }
}

impl FromIterator<(String, SecretNode)> for SecretTree {
    fn from_iter<I: IntoIterator<Item = (String, SecretNode)>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for SecretTree {
    type Item = (String, SecretNode);
    type IntoIter = btree_map::IntoIter<String, SecretNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a SecretTree {
    type Item = (&'a String, &'a SecretNode);
    type IntoIter = btree_map::Iter<'a, String, SecretNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Render a leaf value as text.
///
/// Strings are used as-is; everything else is its JSON representation.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
