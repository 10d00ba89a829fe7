//! kvport - Browse, export and re-import trees of secrets from a KV v2 store.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── import        # Import secrets from JSON/YAML
//! │   ├── export        # Render a subtree of the store
//! │   ├── completions   # Shell completions
//! │   └── output        # Terminal status helpers
//! └── core/             # Core library components
//!     ├── tree          # SecretTree / SecretNode model
//!     ├── path          # flatten / unflatten path algebra
//!     ├── root          # Root path inference
//!     ├── merge         # Deep merge for dry-run previews
//!     ├── render/       # Output formats and masking
//!     ├── input         # JSON/YAML input parsing
//!     ├── backend/      # Secret store backends
//!     │   ├── mod       # Backend trait
//!     │   ├── vault     # KV v2 HTTP client
//!     │   ├── file      # JSON file store
//!     │   └── memory    # In-memory store
//!     ├── import        # Import flow
//!     ├── export        # Export flow
//!     └── config        # config.toml settings
//! ```
//!
//! # Features
//!
//! - Lossless conversion between nested trees and path-addressed secrets
//! - Root path inference for re-importing exported trees
//! - Dry-run previews merging new secrets over existing ones
//! - Native, JSON, YAML and shell-export output with value masking

pub mod cli;
pub mod core;
pub mod error;
