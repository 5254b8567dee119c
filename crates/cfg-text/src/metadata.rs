//! Source location of a loaded document
#![allow(clippy::must_use_candidate)] // Constructor helpers are clear at call sites without #[must_use].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a document was read from, relative to a source root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Bare file name, e.g. `GeneralNPCObjPrototypes.cfg`
    pub file_name: String,

    /// Path relative to the source root, including the file name
    pub relative_path: PathBuf,
}

impl SourceInfo {
    /// Build source info from a relative path.
    ///
    /// Returns `None` when the path has no file name component.
    pub fn from_relative(relative_path: impl Into<PathBuf>) -> Option<Self> {
        let relative_path = relative_path.into();
        let file_name = relative_path.file_name()?.to_string_lossy().into_owned();
        Some(Self {
            file_name,
            relative_path,
        })
    }

    /// Directory part of the relative path (empty for files at the root).
    pub fn relative_dir(&self) -> &Path {
        self.relative_path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// File name without its extension, e.g. `GeneralNPCObjPrototypes`.
    pub fn base_name(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.file_name)
    }
}
