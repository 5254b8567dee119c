#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # cfg-patch
//!
//! Sparse override generation and multi-file patch sessions.
//!
//! A [`PatchSession`] loads source documents, merges their inheritance
//! graphs, indexes which file declares which struct, buffers generated
//! [`PatchFragment`]s per source file and finally writes them next to a
//! mirrored copy of the source layout:
//!
//! ```text
//! <mod_root>/<source_dir>/<Base>/<Base>_patch_<Mod>.cfg
//! ```

pub mod config;
pub mod fragment;
pub mod layout;
pub mod session;

pub use config::SessionConfig;
pub use fragment::{Entry, FragmentBuilder, PatchFragment, Section, already_patched};
pub use layout::{LayoutIssue, LayoutReport, PatchKind, patch_destination, validate_layout};
pub use session::{PatchSession, SaveSummary, StructLocation};

use thiserror::Error;

/// Errors that can occur while generating or writing patches
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error during {operation} for '{path}': {message}")]
    Io {
        operation: String,
        path: String,
        message: String,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("No loaded source file named '{0}'")]
    UnknownFile(String),

    #[error(transparent)]
    Text(#[from] cfg_text::Error),
}

impl Error {
    /// Create a structured I/O error with operation/path context.
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
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_preserves_operation_and_path_context() {
        let error = Error::io("write", "/tmp/out.cfg", "disk full");
        match error {
            Error::Io {
                operation,
                path,
                message,
            } => {
                assert_eq!(operation, "write");
                assert_eq!(path, "/tmp/out.cfg");
                assert_eq!(message, "disk full");
            }
            _ => panic!("expected io variant"),
        }
    }

    #[test]
    fn text_errors_convert() {
        let error: Error = cfg_text::Error::invalid_path("", "has no file name").into();
        assert!(matches!(error, Error::Text(_)));
        assert_eq!(error.to_string(), "Invalid path '': has no file name");
    }
}
