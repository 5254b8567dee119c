//! Multi-file patch session
//!
//! Load -> query -> `add_patch` -> `save_all`, single-threaded. The graph and
//! the struct index are read-only once loading is done; fragments keep the
//! order they were added in, per output file.

use crate::config::SessionConfig;
use crate::layout::patch_destination;
use crate::{Error, Result};
use cfg_inherit::{InheritanceGraph, Resolver};
use cfg_text::{BlockSource, Document, Scope, find_block};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Which loaded document declared a struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLocation {
    pub file_name: String,
    pub relative_path: PathBuf,
}

/// Result of [`PatchSession::save_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveSummary {
    /// Fragments written across all files
    pub fragments: usize,
    /// Patch files written, in write order
    pub written: Vec<PathBuf>,
}

impl SaveSummary {
    pub fn files(&self) -> usize {
        self.written.len()
    }
}

/// Loaded documents, their combined inheritance graph, and buffered patches
#[derive(Debug)]
pub struct PatchSession {
    source_root: PathBuf,
    output_root: PathBuf,
    scope: Scope,
    documents: HashMap<String, Document>,
    graph: InheritanceGraph,
    index: HashMap<String, StructLocation>,
    pending: BTreeMap<String, Vec<String>>,
}

impl PatchSession {
    /// Create an empty session reading from `source_root` and writing under
    /// `output_root`.
    pub fn new(source_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
            scope: Scope::default(),
            documents: HashMap::new(),
            graph: InheritanceGraph::new(),
            index: HashMap::new(),
            pending: BTreeMap::new(),
        }
    }

    /// Create a session from config and load its configured files.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let mut session =
            Self::new(&config.source_root, config.mod_root()).with_scope(config.scan_mode);
        session.load(&config.files)?;
        Ok(session)
    }

    /// Choose which declarations feed the graph and the struct index.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Load source files relative to the source root.
    ///
    /// Missing files are logged and skipped. Returns how many were loaded.
    pub fn load<I, P>(&mut self, relative_paths: I) -> Result<usize>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut loaded = 0;
        for relative in relative_paths {
            let relative = relative.as_ref();
            let full_path = self.source_root.join(relative);
            if !full_path.is_file() {
                warn!("Source file not found, skipping: {}", full_path.display());
                continue;
            }
            let document = Document::read(&self.source_root, relative)?;
            self.insert_document(document);
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Add an already-loaded document, as `load` does for files on disk.
    pub fn insert_document(&mut self, document: Document) {
        let file_name = document.file_name().to_string();
        let relative_path = document.source().relative_path.clone();
        let graph = InheritanceGraph::from_document(&document, self.scope);

        for name in graph.names() {
            let location = StructLocation {
                file_name: file_name.clone(),
                relative_path: relative_path.clone(),
            };
            if let Some(previous) = self.index.insert(name.to_string(), location) {
                if previous.file_name != file_name {
                    warn!(
                        "Struct {} declared in both {} and {}, using {}",
                        name, previous.file_name, file_name, file_name
                    );
                }
            }
        }

        debug!(
            "Loaded {} ({} structs)",
            relative_path.display(),
            graph.len()
        );
        self.graph.merge(graph);
        if let Some(replaced) = self.documents.insert(file_name, document) {
            warn!(
                "Replaced previously loaded {}",
                replaced.source().relative_path.display()
            );
        }
    }

    /// Combined inheritance graph of every loaded document
    pub fn graph(&self) -> &InheritanceGraph {
        &self.graph
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.graph)
    }

    /// `base` and every struct inheriting from it, sorted.
    pub fn inheritors(&self, base: &str) -> Vec<String> {
        self.resolver().descendants(base, true).into_iter().collect()
    }

    pub fn document(&self, file_name: &str) -> Option<&Document> {
        self.documents.get(file_name)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Which document declared `struct_name`
    pub fn location(&self, struct_name: &str) -> Option<&StructLocation> {
        self.index.get(struct_name)
    }

    /// Queue a fragment for the patch of `file_name`.
    ///
    /// No deduplication happens here; `file_name` must be a loaded document.
    pub fn add_patch(&mut self, file_name: &str, fragment: impl Into<String>) -> Result<()> {
        if !self.documents.contains_key(file_name) {
            return Err(Error::UnknownFile(file_name.to_string()));
        }
        let mut text = fragment.into();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        self.pending
            .entry(file_name.to_string())
            .or_default()
            .push(text);
        Ok(())
    }

    /// Fragments queued for `file_name`, in insertion order
    pub fn pending(&self, file_name: &str) -> &[String] {
        self.pending.get(file_name).map_or(&[], Vec::as_slice)
    }

    /// Total fragments queued across all files
    pub fn pending_count(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Write every non-empty buffer to its mirrored patch location, then
    /// clear the buffers.
    pub fn save_all(&mut self, mod_name: &str) -> Result<SaveSummary> {
        let mut summary = SaveSummary::default();

        for (file_name, fragments) in std::mem::take(&mut self.pending) {
            if fragments.is_empty() {
                continue;
            }
            let document = self
                .documents
                .get(&file_name)
                .ok_or_else(|| Error::UnknownFile(file_name.clone()))?;
            let destination = patch_destination(&self.output_root, document.source(), mod_name);

            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::io("create_dir", parent.display().to_string(), e.to_string())
                })?;
            }
            std::fs::write(&destination, fragments.join("\n")).map_err(|e| {
                Error::io("write", destination.display().to_string(), e.to_string())
            })?;

            debug!(
                "Wrote {} patches to {}",
                fragments.len(),
                destination.display()
            );
            summary.fragments += fragments.len();
            summary.written.push(destination);
        }

        info!(
            "Saved {} patches across {} files for {}",
            summary.fragments,
            summary.files(),
            mod_name
        );
        Ok(summary)
    }
}

impl BlockSource for PatchSession {
    fn block(&self, name: &str) -> Option<&str> {
        let location = self.index.get(name)?;
        let document = self.documents.get(&location.file_name)?;
        find_block(document.text(), name, self.scope)
    }
}
