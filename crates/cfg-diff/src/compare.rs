//! Original-vs-patch comparison

use crate::flatten::flatten_struct;
use cfg_text::{Scope, Value, declared_names, find_block};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// How a patched field relates to the original
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Unchanged,
    Modified,
    /// Not written in the original struct (usually inherited there)
    Added,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Unchanged => f.write_str("unchanged"),
            ChangeKind::Modified => f.write_str("modified"),
            ChangeKind::Added => f.write_str("added"),
        }
    }
}

/// One patched field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDiff {
    pub path: String,
    pub original: Option<String>,
    pub patched: String,
    pub kind: ChangeKind,
}

impl FieldDiff {
    /// `patched - original` when both sides are numeric
    pub fn delta(&self) -> Option<f64> {
        let original = Value::parse(self.original.as_deref()?).as_f64()?;
        let patched = Value::parse(&self.patched).as_f64()?;
        Some(patched - original)
    }
}

/// Every patched field of one struct
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDiff {
    pub name: String,
    /// The original text has no struct with this name
    pub missing_in_original: bool,
    pub fields: Vec<FieldDiff>,
}

impl StructDiff {
    /// Whether any field actually changes an original value
    pub fn has_changes(&self) -> bool {
        self.fields.iter().any(|f| f.kind == ChangeKind::Modified)
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.fields.iter().filter(|f| f.kind == kind).count()
    }
}

/// Totals over the reported structs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Patch structs examined before the limit was reached
    pub structs_compared: usize,
    pub structs_changed: usize,
    pub modified: usize,
    pub added: usize,
    pub unchanged: usize,
}

/// Result of [`compare`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffReport {
    pub generated_at: DateTime<Utc>,
    pub structs: Vec<StructDiff>,
    pub summary: DiffSummary,
}

/// Options for [`compare`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareOptions {
    /// Stop after this many changed structs
    pub limit: Option<usize>,
    /// Drop unchanged fields from the reported structs
    pub changed_only: bool,
}

impl CompareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn changed_only(mut self, changed_only: bool) -> Self {
        self.changed_only = changed_only;
        self
    }
}

/// Compare every top-level struct in `patch` with the same struct in
/// `original`.
///
/// Only structs with at least one modified field are reported. Values are
/// compared through [`Value`], so `5.0f` and `5` are equal.
pub fn compare(original: &str, patch: &str, options: &CompareOptions) -> DiffReport {
    let mut summary = DiffSummary::default();
    let mut structs = Vec::new();

    for name in declared_names(patch, Scope::TopLevel) {
        if options.limit.is_some_and(|limit| structs.len() >= limit) {
            break;
        }
        let Some(patch_block) = find_block(patch, name, Scope::TopLevel) else {
            debug!("Skipping unbalanced patch struct {}", name);
            continue;
        };
        summary.structs_compared += 1;

        let original_block = find_block(original, name, Scope::TopLevel);
        let mut diff = compare_struct(name, original_block, patch_block);
        if !diff.has_changes() {
            continue;
        }

        summary.structs_changed += 1;
        summary.modified += diff.count(ChangeKind::Modified);
        summary.added += diff.count(ChangeKind::Added);
        summary.unchanged += diff.count(ChangeKind::Unchanged);

        if options.changed_only {
            diff.fields.retain(|f| f.kind != ChangeKind::Unchanged);
        }
        structs.push(diff);
    }

    debug!(
        "Compared {} structs, {} changed",
        summary.structs_compared, summary.structs_changed
    );
    DiffReport {
        generated_at: Utc::now(),
        structs,
        summary,
    }
}

fn compare_struct(name: &str, original_block: Option<&str>, patch_block: &str) -> StructDiff {
    let original: HashMap<String, String> = original_block
        .map(flatten_struct)
        .unwrap_or_default()
        .into_iter()
        .map(|f| (f.path, f.raw))
        .collect();

    let fields = flatten_struct(patch_block)
        .into_iter()
        .map(|field| {
            let before = original.get(&field.path).cloned();
            let kind = match &before {
                None => ChangeKind::Added,
                Some(raw) if Value::parse(raw).same_as(&Value::parse(&field.raw)) => {
                    ChangeKind::Unchanged
                }
                Some(_) => ChangeKind::Modified,
            };
            FieldDiff {
                path: field.path,
                original: before,
                patched: field.raw,
                kind,
            }
        })
        .collect();

    StructDiff {
        name: name.to_string(),
        missing_in_original: original_block.is_none(),
        fields,
    }
}
