//! Child -> parent graph built from struct declarations

use crate::Result;
use cfg_text::{Document, Scope};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, trace};

static TOP_LEVEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^(\w+)[ \t]*:[ \t]*struct\.begin\b([^\r\n]*)")
        .expect("declaration pattern is valid")
});

static ANY_DEPTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(\w+)[ \t]*:[ \t]*struct\.begin\b([^\r\n]*)")
        .expect("declaration pattern is valid")
});

static REFKEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\{[^}]*\brefkey[ \t]*=[ \t]*\[?(\w+)").expect("refkey pattern is valid")
});

/// Mapping of struct name to its direct parent (or `None` for a root).
///
/// Names are the join key across documents. Re-inserting a name replaces
/// its previous entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InheritanceGraph {
    parents: HashMap<String, Option<String>>,
}

impl InheritanceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `text` for declarations and read each one's `refkey` parent.
    pub fn from_text(text: &str, scope: Scope) -> Self {
        let pattern = match scope {
            Scope::TopLevel => &*TOP_LEVEL,
            Scope::AnyDepth => &*ANY_DEPTH,
        };

        let mut graph = Self::new();
        for caps in pattern.captures_iter(text) {
            let (Some(name), Some(tail)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let parent = REFKEY
                .captures(tail.as_str())
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
            trace!(name = name.as_str(), parent = ?parent, "declaration");
            graph.insert(name.as_str(), parent);
        }
        graph
    }

    /// Scan a loaded document.
    pub fn from_document(document: &Document, scope: Scope) -> Self {
        let graph = Self::from_text(document.text(), scope);
        debug!(
            "Built inheritance graph for {}: {} structs",
            document.file_name(),
            graph.len()
        );
        graph
    }

    /// Read and scan a file.
    pub fn from_file(path: &Path, scope: Scope) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            cfg_text::Error::io("read", path.display().to_string(), e.to_string())
        })?;
        Ok(Self::from_text(text.trim_start_matches('\u{feff}'), scope))
    }

    /// Record `child -> parent`, returning the replaced entry if any.
    pub fn insert(
        &mut self,
        child: impl Into<String>,
        parent: Option<String>,
    ) -> Option<Option<String>> {
        self.parents.insert(child.into(), parent)
    }

    /// Fold another graph into this one. Entries from `other` win.
    pub fn merge(&mut self, other: InheritanceGraph) {
        self.parents.extend(other.parents);
    }

    /// Direct parent of `name`, if it is declared and has one.
    pub fn parent(&self, name: &str) -> Option<&str> {
        self.parents.get(name).and_then(|p| p.as_deref())
    }

    /// Whether `name` was declared.
    pub fn contains(&self, name: &str) -> bool {
        self.parents.contains_key(name)
    }

    /// All declared names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parents.keys().map(String::as_str)
    }

    /// `(child, parent)` pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.parents
            .iter()
            .map(|(child, parent)| (child.as_str(), parent.as_deref()))
    }

    /// Declared names without a parent, sorted.
    pub fn roots(&self) -> Vec<&str> {
        let mut roots: Vec<&str> = self
            .iter()
            .filter(|(_, parent)| parent.is_none())
            .map(|(name, _)| name)
            .collect();
        roots.sort_unstable();
        roots
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}
