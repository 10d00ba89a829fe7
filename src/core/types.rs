//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A slash-delimited secret path (e.g., `secret/app/db`).
///
/// Never begins or ends with the delimiter once normalized.
pub type SecretPath = String;

/// A key inside a secret (e.g., `password`).
pub type SecretKey = String;
