//! Error types.
//!
//! Each concern has its own enum; [`Error`] wraps them so callers can use a
//! single `Result` alias and still match on the specific failure.

use thiserror::Error;

/// Top-level error returned by every fallible kvport operation.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structural problems with a secret tree or flat secret set.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("malformed secret tree at \"{path}\": {reason}")]
    Malformed { path: String, reason: String },

    #[error("cannot determine root path: expected exactly one top-level key, found {}", describe_candidates(.candidates))]
    AmbiguousRoot { candidates: Vec<String> },
}

impl TreeError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

fn describe_candidates(candidates: &[String]) -> String {
    if candidates.is_empty() {
        "none".to_string()
    } else {
        format!("{} ({})", candidates.len(), candidates.join(", "))
    }
}

/// Rendering failures.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("unsupported output format: {0} (expected one of: native, json, yaml, export)")]
    UnsupportedFormat(String),

    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Input parsing failures.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("no input found, perhaps the piped command failed or the file is empty")]
    Empty,

    #[error("cannot parse input as JSON ({json}) or YAML ({yaml})")]
    Unrecognized { json: String, yaml: String },
}

/// Secret-store backend failures.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("KV engine \"{0}\" is already enabled")]
    EngineExists(String),

    #[error("KV engine \"{0}\" is not enabled")]
    EngineNotFound(String),

    #[error("error writing secret \"{path}\": {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<BackendError>,
    },

    #[error("request to secret store failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("secret store returned {status} for \"{path}\": {message}")]
    Status {
        status: u16,
        path: String,
        message: String,
    },

    #[error("failed to access backend file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid backend data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration and flag validation failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("invalid flag combination: {0}")]
    InvalidFlagCombination(&'static str),

    #[error("no secret store address configured")]
    MissingAddress,

    #[error("no secret store token configured")]
    MissingToken,
}

pub type Result<T> = std::result::Result<T, Error>;
