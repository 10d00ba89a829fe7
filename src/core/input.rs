//! Input parsing.
//!
//! Accepts the JSON or YAML produced by `kvport export` (or any document of
//! the same shape) and builds a [`SecretTree`] from it.

use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::core::tree::SecretTree;
use crate::error::{ParseError, Result};

/// Encoding an input document was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Json => f.write_str("JSON"),
            InputFormat::Yaml => f.write_str("YAML"),
        }
    }
}

/// Parse raw bytes into a secret tree, trying JSON first and YAML second.
///
/// # Errors
///
/// Returns `ParseError::Empty` for blank input, `ParseError::Unrecognized`
/// if neither parser accepts it, and `TreeError::Malformed` if the document
/// parses but is not a tree of secrets.
pub fn parse_input(bytes: &[u8]) -> Result<(SecretTree, InputFormat)> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ParseError::Empty.into());
    }

    let (value, format) = match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => (value, InputFormat::Json),
        Err(json_err) => match serde_yaml::from_slice::<Value>(bytes) {
            Ok(value) => (value, InputFormat::Yaml),
            Err(yaml_err) => {
                return Err(ParseError::Unrecognized {
                    json: json_err.to_string(),
                    yaml: yaml_err.to_string(),
                }
                .into())
            }
        },
    };

    debug!(%format, "parsed input");

    Ok((SecretTree::from_value(value)?, format))
}
