#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # cfg-diff
//!
//! Field-level comparison of original config structs against patch
//! fragments.
//!
//! Each top-level struct in a patch is flattened into `(path, value)` pairs
//! and matched against the same struct in the original file. The resulting
//! [`DiffReport`] renders as aligned text, CSV or JSON.
//!
//! ## Example Usage
//!
//! ```rust
//! use cfg_diff::{CompareOptions, ReportFormat, compare, render};
//!
//! let original = "Guard : struct.begin\n   MaxShots = 4\nstruct.end\n";
//! let patch = "Guard : struct.begin {bpatch}\n   MaxShots = 6\nstruct.end\n";
//!
//! let report = compare(original, patch, &CompareOptions::new());
//! assert_eq!(report.summary.modified, 1);
//!
//! let text = render(&report, ReportFormat::Text).unwrap();
//! assert!(text.contains("== Guard"));
//! ```

pub mod compare;
pub mod flatten;
pub mod render;

pub use compare::{
    ChangeKind, CompareOptions, DiffReport, DiffSummary, FieldDiff, StructDiff, compare,
};
pub use flatten::{FlatField, flatten_struct};
pub use render::{ReportFormat, render, render_json, render_text, write_csv};

use thiserror::Error;

/// Errors that can occur while comparing or rendering
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown report format '{0}' (expected text, csv or json)")]
    UnknownFormat(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error during {operation} for '{path}': {message}")]
    Io {
        operation: String,
        path: String,
        message: String,
    },
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

/// Read both files and compare them.
///
/// # Errors
///
/// Returns an error when either file cannot be read.
pub fn compare_files(
    original: &std::path::Path,
    patch: &std::path::Path,
    options: &CompareOptions,
) -> Result<DiffReport> {
    let original = read_config(original)?;
    let patch = read_config(patch)?;
    Ok(compare(&original, &patch, options))
}

fn read_config(path: &std::path::Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::io("read", path.display().to_string(), e.to_string()))?;
    Ok(text
        .strip_prefix('\u{feff}')
        .map(str::to_string)
        .unwrap_or(text))
}
