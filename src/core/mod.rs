//! Core library components.
//!
//! The secret tree model and its path algebra, root inference, merging and
//! rendering are pure functions over in-memory values. The import and export
//! flows sequence them around a [`backend::Backend`].

pub mod backend;
pub mod config;
pub mod constants;
pub mod export;
pub mod import;
pub mod input;
pub mod merge;
pub mod path;
pub mod render;
pub mod root;
pub mod tree;
pub mod types;
