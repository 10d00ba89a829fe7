//! Test fixtures and constants.

/// JSON export of one engine with two secrets.
pub const SAMPLE_JSON: &str = r#"{
  "secret": {
    "app": {
      "db": { "user": "alice", "pass": "s3cret" }
    },
    "ci": { "token": "xyz" }
  }
}"#;

/// The same tree as [`SAMPLE_JSON`] in YAML.
pub const SAMPLE_YAML: &str = "\
secret:
  app:
    db:
      user: alice
      pass: s3cret
  ci:
    token: xyz
";

/// Input with more than one top-level key.
pub const MULTI_ROOT_JSON: &str = r#"{
  "app": { "user": "alice" },
  "ci": { "token": "xyz" }
}"#;

/// Store contents matching [`SAMPLE_JSON`].
pub fn sample_engines() -> serde_json::Value {
    serde_json::json!({
        "secret": {
            "app/db": { "user": "alice", "pass": "s3cret" },
            "ci": { "token": "xyz" }
        }
    })
}
