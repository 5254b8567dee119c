//! Loaded configuration documents
#![allow(clippy::must_use_candidate)] // Constructor/accessor API intentionally omits pervasive #[must_use].

use crate::block::{self, BlockSource, Scope};
use crate::metadata::SourceInfo;
use crate::{Error, Result};
use std::path::Path;
use tracing::trace;

const BOM: char = '\u{feff}';

/// The raw text of one source config file. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Document {
    source: SourceInfo,
    text: String,
}

impl Document {
    /// Wrap already-loaded text. A leading byte-order mark is dropped.
    pub fn new(source: SourceInfo, text: impl Into<String>) -> Self {
        let mut text = text.into();
        if text.starts_with(BOM) {
            text.drain(..BOM.len_utf8());
        }
        Self { source, text }
    }

    /// Convenience constructor for in-memory text named by a relative path.
    pub fn from_text(relative_path: &str, text: impl Into<String>) -> Result<Self> {
        let source = SourceInfo::from_relative(relative_path)
            .ok_or_else(|| Error::invalid_path(relative_path, "has no file name"))?;
        Ok(Self::new(source, text))
    }

    /// Read `root/relative_path` from disk.
    pub fn read(root: &Path, relative_path: &Path) -> Result<Self> {
        let source = SourceInfo::from_relative(relative_path).ok_or_else(|| {
            Error::invalid_path(relative_path.display().to_string(), "has no file name")
        })?;
        let full_path = root.join(relative_path);
        trace!("Reading document: {:?}", full_path);
        let text = std::fs::read_to_string(&full_path).map_err(|e| {
            Error::io("read", full_path.display().to_string(), e.to_string())
        })?;
        Ok(Self::new(source, text))
    }

    /// Full text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Where the text came from.
    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    /// Bare file name.
    pub fn file_name(&self) -> &str {
        &self.source.file_name
    }

    /// Names of all declarations in this document.
    pub fn struct_names(&self, scope: Scope) -> Vec<&str> {
        block::declared_names(&self.text, scope)
    }
}

impl BlockSource for Document {
    fn block(&self, name: &str) -> Option<&str> {
        block::find_block(&self.text, name, Scope::TopLevel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_document_strips_bom() {
        let doc = Document::from_text("A.cfg", "\u{feff}A : struct.begin\nstruct.end\n").unwrap();
        assert!(doc.text().starts_with("A : struct.begin"));
        assert!(doc.block("A").is_some());
    }

    #[test]
    fn test_document_rejects_nameless_path() {
        assert!(Document::from_text("", "x").is_err());
    }

    #[test]
    fn test_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let rel = PathBuf::from("Data/Weapons.cfg");
        std::fs::create_dir_all(dir.path().join("Data")).unwrap();
        std::fs::write(dir.path().join(&rel), "Gun : struct.begin\n   Ammo = 30\nstruct.end\n")
            .unwrap();

        let doc = Document::read(dir.path(), &rel).unwrap();
        assert_eq!(doc.file_name(), "Weapons.cfg");
        assert_eq!(doc.source().relative_path, rel);
        assert_eq!(doc.struct_names(Scope::TopLevel), vec!["Gun"]);
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Document::read(dir.path(), Path::new("Nope.cfg")).unwrap_err();
        assert!(matches!(err, Error::Io { ref operation, .. } if operation == "read"));
    }
}
