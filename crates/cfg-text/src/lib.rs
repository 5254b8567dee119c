#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # cfg-text
//!
//! Text-level access to the `struct.begin` / `struct.end` configuration format.
//!
//! Nothing in this crate builds a syntax tree. Blocks are located by searching
//! for their declaration line and counting nested begin/end markers until the
//! nesting level returns to zero, and scalar fields are read straight out of
//! the located span.
//!
//! ```text
//! NPCBase : struct.begin {refkey=Base}
//!    CombatParameters : struct.begin
//!       CheckEnemyTime = 20.0f
//!    struct.end
//! struct.end
//! ```

/// Struct-block locator and nested section lookup.
pub mod block;
/// Loaded source documents.
pub mod document;
/// Source locations of loaded documents.
pub mod metadata;
/// Scalar value extraction and coercion.
pub mod value;

/// Block lookups and the block-source seam.
pub use block::{
    BlockSource, Scope, declared_names, find_block, find_block_span, find_section, has_property,
    has_section,
};
/// Loaded document type.
pub use document::Document;
/// Source path metadata.
pub use metadata::SourceInfo;
/// Typed scalar values.
pub use value::{Value, extract_raw, extract_value, float_literal, round_to_nearest};

use thiserror::Error;

/// Errors that can occur while loading configuration text
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error during {operation} for '{path}': {message}")]
    Io {
        operation: String,
        path: String,
        message: String,
    },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl Error {
    /// Build an I/O error with operation and path context.
    pub fn io(
        operation: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build an invalid-path error with the offending path and reason.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-local result type for text operations.
pub type Result<T> = std::result::Result<T, Error>;
