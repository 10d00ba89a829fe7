//! Secret rendering.
//!
//! Turns a [`SecretTree`] into text in one of several formats. Values are
//! masked first (unless disabled), then the keys-only or paths-only filter
//! is applied, then the tree is emitted with keys in lexicographic order at
//! every level.
//!
//! ## Example
//!
//! ```
//! use kvport::core::render::{Renderer, RenderOptions};
//! use kvport::core::tree::SecretTree;
//!
//! let tree = SecretTree::from_value(serde_json::json!({
//!     "db": { "user": "alice", "pass": "s3cretpassword" }
//! })).unwrap();
//!
//! let renderer = Renderer::new(RenderOptions { mask_length: 4, ..Default::default() }).unwrap();
//! assert_eq!(renderer.render(&tree).unwrap(), "db\n\tpass=****\n\tuser=****\n");
//! ```

pub mod mask;

use serde_json::Value;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::core::constants::{DEFAULT_MAX_VALUE_LENGTH, UNMASKED};
use crate::core::path;
use crate::core::tree::{stringify, SecretLeaf, SecretNode, SecretTree};
use crate::error::{ConfigError, RenderError, Result};

/// Output encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Indented plain text, one path per line with its keys beneath.
    #[default]
    Native,
    Json,
    Yaml,
    /// `export KEY=value` statements for a POSIX shell.
    Export,
}

impl FromStr for Format {
    type Err = RenderError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "base" => Ok(Format::Native),
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "export" | "shell-export" => Ok(Format::Export),
            other => Err(RenderError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Native => "native",
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Export => "export",
        };
        f.write_str(name)
    }
}

/// Rendering configuration.
///
/// Defaults: native format, values masked to at most 12 characters, full
/// key=value output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub format: Format,
    /// Replace values with mask characters.
    pub mask_values: bool,
    /// Maximum mask length; `-1` leaves values unmasked even when
    /// `mask_values` is set.
    pub mask_length: i64,
    /// Show keys without values.
    pub only_keys: bool,
    /// Show paths without any leaf content.
    pub only_paths: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: Format::Native,
            mask_values: true,
            mask_length: DEFAULT_MAX_VALUE_LENGTH,
            only_keys: false,
            only_paths: false,
        }
    }
}

impl RenderOptions {
    /// Check option consistency.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `mask_length` is below -1 or both
    /// `only_keys` and `only_paths` are set.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.mask_length < UNMASKED {
            return Err(ConfigError::InvalidValue {
                field: "max_value_length",
                reason: format!(
                    "must be at least 0, or -1 to disable masking (got {})",
                    self.mask_length
                ),
            });
        }

        if self.only_keys && self.only_paths {
            return Err(ConfigError::InvalidFlagCombination(
                "cannot show only keys and only paths at the same time",
            ));
        }

        Ok(())
    }
}

/// Renders secret trees with a fixed set of options.
#[derive(Debug, Clone)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    /// Create a renderer after validating `options`.
    pub fn new(options: RenderOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Apply masking and the keys-only filter to a copy of `tree`.
    ///
    /// The paths-only filter is applied at emission time since it changes
    /// the shape of the output rather than the values.
    pub fn prepare(&self, tree: &SecretTree) -> SecretTree {
        let mut prepared = tree.clone();

        if self.options.mask_values {
            mask::mask_tree(&mut prepared, self.options.mask_length);
        }

        if self.options.only_keys {
            blank_values(&mut prepared);
        }

        prepared
    }

    /// Render `tree` to a string.
    pub fn render(&self, tree: &SecretTree) -> Result<String> {
        let prepared = self.prepare(tree);

        let text = match self.options.format {
            Format::Native => self.render_native(&prepared),
            Format::Json => {
                let mut out = serde_json::to_string_pretty(&self.structured(&prepared))
                    .map_err(RenderError::from)?;
                out.push('\n');
                out
            }
            Format::Yaml => {
                serde_yaml::to_string(&self.structured(&prepared)).map_err(RenderError::from)?
            }
            Format::Export => self.render_export(&prepared),
        };

        Ok(text)
    }

    /// Render `tree` into a writer.
    pub fn write_to<W: Write + ?Sized>(&self, tree: &SecretTree, out: &mut W) -> Result<()> {
        out.write_all(self.render(tree)?.as_bytes())?;
        Ok(())
    }

    fn structured(&self, tree: &SecretTree) -> Value {
        if !self.options.only_paths {
            return tree.to_value();
        }

        Value::Object(
            tree.iter()
                .map(|(segment, node)| {
                    let value = match node {
                        SecretNode::Leaf(_) => Value::Null,
                        SecretNode::Subtree(subtree) => self.structured(subtree),
                    };
                    (segment.clone(), value)
                })
                .collect(),
        )
    }

    fn render_native(&self, tree: &SecretTree) -> String {
        let mut output = String::new();
        for_each_leaf(tree, "", &mut |path, leaf| {
            output.push_str(&format!("{}\n", path));

            if self.options.only_paths {
                return;
            }

            for (key, value) in leaf {
                if self.options.only_keys {
                    output.push_str(&format!("\t{}\n", key));
                } else {
                    output.push_str(&format!("\t{}={}\n", key, stringify(value)));
                }
            }
        });
        output
    }

    fn render_export(&self, tree: &SecretTree) -> String {
        let mut output = String::new();
        if self.options.only_paths {
            return output;
        }

        for_each_leaf(tree, "", &mut |_, leaf| {
            for (key, value) in leaf {
                output.push_str(&format!("export {}={}\n", key, shell_quote(&stringify(value))));
            }
        });
        output
    }
}

fn blank_values(tree: &mut SecretTree) {
    for (_, node) in tree.iter_mut() {
        match node {
            SecretNode::Subtree(subtree) => blank_values(subtree),
            SecretNode::Leaf(leaf) => {
                for value in leaf.values_mut() {
                    *value = Value::String(String::new());
                }
            }
        }
    }
}

fn for_each_leaf(tree: &SecretTree, parent: &str, visit: &mut dyn FnMut(&str, &SecretLeaf)) {
    for (segment, node) in tree {
        let path = path::join([parent, segment.as_str()]);
        match node {
            SecretNode::Subtree(subtree) => for_each_leaf(subtree, &path, visit),
            SecretNode::Leaf(leaf) => visit(&path, leaf),
        }
    }
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|ch| ch.is_whitespace() || "#=\"'\\$`;&|<>()*?!~{}[]".contains(ch))
}

fn shell_quote(value: &str) -> String {
    if !needs_quotes(value) {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '$' => quoted.push_str("\\$"),
            '`' => quoted.push_str("\\`"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> SecretTree {
        SecretTree::from_value(json!({
            "secret": {
                "app": {
                    "db": { "user": "alice", "pass": "s3cret" }
                },
                "ci": { "token": "xyz" }
            }
        }))
        .unwrap()
    }

    fn render(tree: &SecretTree, options: RenderOptions) -> String {
        Renderer::new(options).unwrap().render(tree).unwrap()
    }

    fn unmasked(format: Format) -> RenderOptions {
        RenderOptions {
            format,
            mask_values: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("YAML".parse::<Format>().unwrap(), Format::Yaml);
        assert_eq!("shell-export".parse::<Format>().unwrap(), Format::Export);
        assert_eq!("base".parse::<Format>().unwrap(), Format::Native);
        assert!(matches!(
            "toml".parse::<Format>(),
            Err(RenderError::UnsupportedFormat(f)) if f == "toml"
        ));
    }

    #[test]
    fn test_options_validation() {
        assert!(RenderOptions::default().validate().is_ok());
        assert!(RenderOptions { mask_length: -1, ..Default::default() }.validate().is_ok());
        assert!(RenderOptions { mask_length: -2, ..Default::default() }.validate().is_err());
        assert!(RenderOptions {
            only_keys: true,
            only_paths: true,
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_native_sorted_and_masked() {
        let out = render(&sample(), RenderOptions::default());

        assert_eq!(
            out,
            "secret/app/db\n\tpass=******\n\tuser=*****\nsecret/ci\n\ttoken=***\n"
        );
    }

    #[test]
    fn test_native_unmasked() {
        let out = render(&sample(), unmasked(Format::Native));
        assert!(out.contains("\tpass=s3cret\n"));
    }

    #[test]
    fn test_mask_length_minus_one_disables_masking() {
        let out = render(&sample(), RenderOptions { mask_length: -1, ..Default::default() });
        assert!(out.contains("\tuser=alice\n"));
    }

    #[test]
    fn test_native_only_keys() {
        let out = render(&sample(), RenderOptions { only_keys: true, ..Default::default() });
        assert_eq!(out, "secret/app/db\n\tpass\n\tuser\nsecret/ci\n\ttoken\n");
    }

    #[test]
    fn test_native_only_paths() {
        let out = render(&sample(), RenderOptions { only_paths: true, ..Default::default() });
        assert_eq!(out, "secret/app/db\nsecret/ci\n");
    }

    #[test]
    fn test_json() {
        let out = render(&sample(), unmasked(Format::Json));
        let parsed: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(parsed, sample().to_value());
        assert!(out.ends_with("}\n"));
    }

    #[test]
    fn test_json_only_paths() {
        let out = render(
            &sample(),
            RenderOptions { format: Format::Json, only_paths: true, ..Default::default() },
        );
        let parsed: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(parsed, json!({ "secret": { "app": { "db": null }, "ci": null } }));
    }

    #[test]
    fn test_json_only_keys() {
        let out = render(
            &sample(),
            RenderOptions { format: Format::Json, only_keys: true, ..Default::default() },
        );
        let parsed: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(parsed["secret"]["ci"], json!({ "token": "" }));
    }

    #[test]
    fn test_yaml() {
        let out = render(&sample(), unmasked(Format::Yaml));
        let parsed: Value = serde_yaml::from_str(&out).unwrap();

        assert_eq!(parsed, sample().to_value());
        assert!(out.find("app:").unwrap() < out.find("ci:").unwrap());
    }

    #[test]
    fn test_export() {
        let out = render(&sample(), unmasked(Format::Export));
        assert_eq!(out, "export pass=s3cret\nexport user=alice\nexport token=xyz\n");
    }

    #[test]
    fn test_export_quotes_special_values() {
        let tree = SecretTree::from_value(json!({
            "app": { "greeting": "hello world", "cmd": "$(rm -rf)", "empty": "" }
        }))
        .unwrap();

        let out = render(&tree, unmasked(Format::Export));

        assert!(out.contains("export greeting=\"hello world\"\n"));
        assert!(out.contains("export cmd=\"\\$(rm -rf)\"\n"));
        assert!(out.contains("export empty=\"\"\n"));
    }

    #[test]
    fn test_export_only_paths_is_empty() {
        let out = render(
            &sample(),
            RenderOptions { format: Format::Export, only_paths: true, ..Default::default() },
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_prepare_does_not_touch_input() {
        let tree = sample();
        let renderer = Renderer::new(RenderOptions::default()).unwrap();

        let prepared = renderer.prepare(&tree);

        assert_ne!(prepared, tree);
        assert_eq!(tree, sample());
    }

    #[test]
    fn test_render_empty_tree() {
        assert_eq!(render(&SecretTree::new(), RenderOptions::default()), "");
        assert_eq!(render(&SecretTree::new(), unmasked(Format::Json)), "{}\n");
    }

    #[test]
    fn test_write_to() {
        let renderer = Renderer::new(RenderOptions::default()).unwrap();
        let mut buf = Vec::new();

        renderer.write_to(&sample(), &mut buf).unwrap();

        assert_eq!(String::from_utf8(buf).unwrap(), renderer.render(&sample()).unwrap());
    }
}
