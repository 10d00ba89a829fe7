//! Path algebra.
//!
//! Converts between the nested [`SecretTree`] and the flat, path-addressed
//! [`FlatSecretSet`], plus the small helpers for joining and splitting
//! slash-delimited paths.

use crate::core::constants::DELIMITER;
use crate::core::tree::{FlatSecretSet, SecretLeaf, SecretNode, SecretTree};
use crate::error::TreeError;
use std::collections::btree_map::Entry;

/// Non-empty segments of a path.
pub fn segments(path: &str) -> Vec<&str> {
    path.split(DELIMITER).filter(|s| !s.is_empty()).collect()
}

/// Join path fragments with the delimiter.
///
/// Each fragment may itself contain delimiters; empty segments and
/// leading/trailing delimiters are dropped, so `join(["kv/", "/app", ""])`
/// is `kv/app`.
pub fn join<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for part in parts {
        for segment in segments(part.as_ref()) {
            if !out.is_empty() {
                out.push_str(DELIMITER);
            }
            out.push_str(segment);
        }
    }
    out
}

/// Normalize a single path.
pub fn normalize_path(path: &str) -> String {
    join([path])
}

/// Split a destination into engine mount and sub-path.
///
/// With an explicit engine path the user's path is the sub-path. Without one
/// the first segment of `path` is taken as the mount.
pub fn handle_engine_path(engine_path: &str, path: &str) -> (String, String) {
    let engine = normalize_path(engine_path);
    if !engine.is_empty() {
        return (engine, normalize_path(path));
    }

    let parts = segments(path);
    match parts.split_first() {
        Some((root, rest)) => (root.to_string(), rest.join(DELIMITER)),
        None => (String::new(), String::new()),
    }
}

/// Remove `prefix` from the front of `path`, comparing whole segments.
///
/// Returns `None` if `path` does not live under `prefix`. The empty prefix
/// matches everything.
pub fn strip_path_prefix(path: &str, prefix: &str) -> Option<String> {
    let path = segments(path);
    let prefix = segments(prefix);

    if path.starts_with(&prefix) {
        Some(path[prefix.len()..].join(DELIMITER))
    } else {
        None
    }
}

/// Flatten a tree into path-addressed leaves below `prefix`.
///
/// # Errors
///
/// Returns `TreeError::Malformed` if a leaf ends up without a path or two
/// leaves normalize to the same path (possible when segment keys contain
/// delimiters).
pub fn flatten(tree: &SecretTree, prefix: &str) -> Result<FlatSecretSet, TreeError> {
    let mut flat = FlatSecretSet::new();
    flatten_into(tree, &normalize_path(prefix), &mut flat)?;
    Ok(flat)
}

fn flatten_into(tree: &SecretTree, parent: &str, flat: &mut FlatSecretSet) -> Result<(), TreeError> {
    for (segment, node) in tree {
        let path = join([parent, segment.as_str()]);
        match node {
            SecretNode::Subtree(subtree) => flatten_into(subtree, &path, flat)?,
            SecretNode::Leaf(leaf) => {
                if path.is_empty() {
                    return Err(TreeError::malformed(segment.as_str(), "secret without a path"));
                }
                if flat.contains_key(&path) {
                    return Err(TreeError::malformed(path, "path appears more than once"));
                }
                flat.insert(path, leaf.clone());
            }
        }
    }
    Ok(())
}

/// Rebuild a tree from path-addressed leaves.
///
/// Every path must live under `prefix`, which is stripped. With an empty
/// `engine_path` the remaining segments are nested directly, giving a tree
/// relative to `prefix`. Otherwise the engine path becomes the single
/// top-level key (kept whole even if it contains delimiters) and whatever
/// part of `prefix` lies beyond it is nested beneath, so the mount is the
/// tree's root rather than a chain of visible segments.
///
/// `flatten(&unflatten(p, &f, e)?, &flatten_prefix(p, e))` gives back `f`.
///
/// # Errors
///
/// Returns `TreeError::Malformed` for a path outside `prefix`, a prefix
/// outside `engine_path`, a path that is both a secret and a directory, or a
/// secret stored at `prefix` itself when there is no engine layer to hold it.
pub fn unflatten(prefix: &str, flat: &FlatSecretSet, engine_path: &str) -> Result<SecretTree, TreeError> {
    let prefix = normalize_path(prefix);
    let engine = normalize_path(engine_path);

    let beyond_engine = if engine.is_empty() {
        None
    } else {
        Some(strip_path_prefix(&prefix, &engine).ok_or_else(|| {
            TreeError::malformed(
                prefix.as_str(),
                format!("prefix is not below engine path \"{}\"", engine),
            )
        })?)
    };

    let mut tree = SecretTree::new();

    for (path, leaf) in flat {
        let rest = strip_path_prefix(path, &prefix).ok_or_else(|| {
            TreeError::malformed(path.as_str(), format!("path is outside of \"{}\"", prefix))
        })?;

        let location: Vec<String> = match &beyond_engine {
            None => {
                if rest.is_empty() {
                    return Err(TreeError::malformed(
                        path.as_str(),
                        "secret stored at the prefix itself",
                    ));
                }
                segments(&rest).into_iter().map(str::to_string).collect()
            }
            Some(beyond) => std::iter::once(engine.clone())
                .chain(segments(&join([beyond.as_str(), rest.as_str()])).into_iter().map(str::to_string))
                .collect(),
        };

        insert_leaf(&mut tree, &location, leaf.clone(), path)?;
    }

    Ok(tree)
}

/// The prefix to flatten an [`unflatten`] result with to get the original
/// paths back.
pub fn flatten_prefix(prefix: &str, engine_path: &str) -> String {
    if normalize_path(engine_path).is_empty() {
        normalize_path(prefix)
    } else {
        String::new()
    }
}

fn insert_leaf(tree: &mut SecretTree, location: &[String], leaf: SecretLeaf, path: &str) -> Result<(), TreeError> {
    let Some((last, parents)) = location.split_last() else {
        return Err(TreeError::malformed(path, "secret without a path"));
    };

    let mut current = tree;
    for segment in parents {
        let node = current
            .entry(segment.clone())
            .or_insert_with(|| SecretNode::Subtree(SecretTree::new()));
        match node {
            SecretNode::Subtree(subtree) => current = subtree,
            SecretNode::Leaf(_) => {
                return Err(TreeError::malformed(
                    path,
                    format!("\"{}\" is both a secret and a directory", segment),
                ))
            }
        }
    }

    match current.entry(last.clone()) {
        Entry::Vacant(slot) => {
            slot.insert(SecretNode::Leaf(leaf));
            Ok(())
        }
        Entry::Occupied(_) => Err(TreeError::malformed(
            path,
            format!("\"{}\" is both a secret and a directory", last),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(pairs: &[(&str, &str)]) -> SecretLeaf {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    fn flat(entries: &[(&str, SecretLeaf)]) -> FlatSecretSet {
        entries
            .iter()
            .map(|(p, l)| (p.to_string(), l.clone()))
            .collect()
    }

    #[test]
    fn test_join_and_normalize() {
        assert_eq!(join(["secret", "app", "db"]), "secret/app/db");
        assert_eq!(join(["kv/", "/app", ""]), "kv/app");
        assert_eq!(join(["", ""]), "");
        assert_eq!(normalize_path("/secret//app/"), "secret/app");
    }

    #[test]
    fn test_handle_engine_path() {
        assert_eq!(
            handle_engine_path("", "secret/app/db"),
            ("secret".to_string(), "app/db".to_string())
        );
        assert_eq!(
            handle_engine_path("kv/prod", "app"),
            ("kv/prod".to_string(), "app".to_string())
        );
        assert_eq!(
            handle_engine_path("", "secret"),
            ("secret".to_string(), String::new())
        );
        assert_eq!(handle_engine_path("", ""), (String::new(), String::new()));
    }

    #[test]
    fn test_strip_path_prefix_is_segment_aware() {
        assert_eq!(strip_path_prefix("secret/app/db", "secret"), Some("app/db".to_string()));
        assert_eq!(strip_path_prefix("secret/app", "secret/app"), Some(String::new()));
        assert_eq!(strip_path_prefix("secrets/app", "secret"), None);
        assert_eq!(strip_path_prefix("secret/app", ""), Some("secret/app".to_string()));
    }

    #[test]
    fn test_flatten_with_prefix() {
        let tree = SecretTree::from_value(json!({
            "app": {
                "db": { "user": "alice" },
                "api": { "key": "abc" }
            }
        }))
        .unwrap();

        let result = flatten(&tree, "secret").unwrap();

        assert_eq!(
            result,
            flat(&[
                ("secret/app/api", leaf(&[("key", "abc")])),
                ("secret/app/db", leaf(&[("user", "alice")])),
            ])
        );
    }

    #[test]
    fn test_flatten_normalizes_delimited_keys() {
        let tree = SecretTree::from_value(json!({
            "kv/prod/": { "db": { "user": "alice" } }
        }))
        .unwrap();

        let result = flatten(&tree, "").unwrap();

        assert!(result.contains_key("kv/prod/db"));
    }

    #[test]
    fn test_flatten_detects_collisions() {
        let tree = SecretTree::from_value(json!({
            "a": { "b": { "k": "1" } },
            "a/b": { "k": "2" }
        }))
        .unwrap();

        assert!(flatten(&tree, "").is_err());
    }

    #[test]
    fn test_unflatten_relative_to_prefix() {
        let input = flat(&[
            ("secret/app/db", leaf(&[("user", "alice")])),
            ("secret/app/api", leaf(&[("key", "abc")])),
        ]);

        let tree = unflatten("secret", &input, "").unwrap();

        assert_eq!(
            tree.to_value(),
            json!({ "app": { "api": { "key": "abc" }, "db": { "user": "alice" } } })
        );
        assert_eq!(flatten(&tree, "secret").unwrap(), input);
    }

    #[test]
    fn test_unflatten_with_engine_wrapping() {
        let input = flat(&[("kv/prod/app/db", leaf(&[("user", "alice")]))]);

        let tree = unflatten("kv/prod/app", &input, "kv/prod").unwrap();

        assert_eq!(
            tree.to_value(),
            json!({ "kv/prod": { "app": { "db": { "user": "alice" } } } })
        );
        assert_eq!(
            flatten(&tree, &flatten_prefix("kv/prod/app", "kv/prod")).unwrap(),
            input
        );
    }

    #[test]
    fn test_unflatten_secret_at_engine_prefix() {
        let input = flat(&[("secret/db", leaf(&[("user", "alice")]))]);

        let tree = unflatten("secret/db", &input, "secret").unwrap();

        assert_eq!(tree.to_value(), json!({ "secret": { "db": { "user": "alice" } } }));
    }

    #[test]
    fn test_unflatten_secret_at_prefix_without_engine_is_malformed() {
        let input = flat(&[("secret/db", leaf(&[("user", "alice")]))]);

        assert!(matches!(
            unflatten("secret/db", &input, ""),
            Err(TreeError::Malformed { .. })
        ));
    }

    #[test]
    fn test_unflatten_path_outside_prefix() {
        let input = flat(&[("other/db", leaf(&[("user", "alice")]))]);

        let err = unflatten("secret", &input, "").unwrap_err();

        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn test_unflatten_leaf_and_directory_collision() {
        // Known gap in the path model: a path cannot hold both a secret and
        // child paths.
        let input = flat(&[
            ("secret/app", leaf(&[("k", "1")])),
            ("secret/app/db", leaf(&[("k", "2")])),
        ]);

        let err = unflatten("secret", &input, "").unwrap_err();

        assert!(err.to_string().contains("both a secret and a directory"));
    }

    #[test]
    fn test_unflatten_empty() {
        let tree = unflatten("secret", &FlatSecretSet::new(), "secret").unwrap();
        assert!(tree.is_empty());
    }
}
