//! Output placement and patch-layout validation
//!
//! Prototype patches use the "folder technique": a patch for
//! `ObjPrototypes/GeneralNPCObjPrototypes.cfg` lives at
//! `ObjPrototypes/GeneralNPCObjPrototypes/GeneralNPCObjPrototypes_patch_<Mod>.cfg`.
//! Standard patches (`<Name>.cfg_patch_<Mod>`) sit next to the original.

use crate::{Error, Result};
use cfg_text::SourceInfo;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

const GAME_DATA: &str = "GameData";
const STANDARD_MARKER: &str = ".cfg_patch_";

static PROTOTYPE_PATCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*)_patch_.*\.cfg$").expect("prototype patch pattern is valid")
});

/// `<Base>_patch_<Mod>.cfg`
pub fn patch_file_name(base_name: &str, mod_name: &str) -> String {
    format!("{base_name}_patch_{mod_name}.cfg")
}

/// Where the patch for `source` goes under `output_root`.
pub fn patch_destination(output_root: &Path, source: &SourceInfo, mod_name: &str) -> PathBuf {
    output_root
        .join(source.relative_dir())
        .join(source.base_name())
        .join(patch_file_name(source.base_name(), mod_name))
}

/// Traditional mod root: `<mods_root>/<Mod>/<Mod>_P/Stalker2`.
pub fn mod_root(mods_root: &Path, mod_name: &str) -> PathBuf {
    mods_root
        .join(mod_name)
        .join(format!("{mod_name}_P"))
        .join("Stalker2")
}

/// Which naming rule a patch file follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    /// `<Base>_patch_<Mod>.cfg` inside a `<Base>` folder
    Prototype,
    /// `<Name>.cfg_patch_<Mod>` next to the original
    Standard,
}

impl fmt::Display for PatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchKind::Prototype => f.write_str("Prototype"),
            PatchKind::Standard => f.write_str("Standard"),
        }
    }
}

/// A misplaced or orphaned patch file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutIssue {
    /// Prototype patch not inside a folder named after its original
    FolderMismatch { file: PathBuf, expected_folder: String },
    /// No original `.cfg` (or `.cfg.bin`) where the patch expects it
    MissingOriginal {
        file: PathBuf,
        kind: PatchKind,
        expected: PathBuf,
    },
}

impl fmt::Display for LayoutIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutIssue::FolderMismatch {
                file,
                expected_folder,
            } => write!(
                f,
                "[FAIL] Prototype folder error: {} (expected parent folder '{expected_folder}')",
                file.display()
            ),
            LayoutIssue::MissingOriginal {
                file,
                kind,
                expected,
            } => write!(
                f,
                "[FAIL] {kind} missing original: {} (expected {} or .bin)",
                file.display(),
                expected.display()
            ),
        }
    }
}

/// Outcome of [`validate_layout`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutReport {
    /// Config and patch files examined
    pub files_checked: usize,
    /// Files skipped because they are not under a `GameData` folder
    pub skipped: usize,
    pub issues: Vec<LayoutIssue>,
}

impl LayoutReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check naming and placement of every patch file under `mod_dir`.
///
/// `source_dump` is the unpacked game's `GameData` directory. Paths are
/// compared from the `GameData` component of each patch file onwards.
pub fn validate_layout(mod_dir: &Path, source_dump: &Path) -> Result<LayoutReport> {
    if !mod_dir.is_dir() {
        return Err(Error::io(
            "validate",
            mod_dir.display().to_string(),
            "not a directory",
        ));
    }

    let files = collect_files(mod_dir)?;
    let mut report = LayoutReport::default();
    for path in files {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let lower = file_name.to_ascii_lowercase();
        if !(lower.ends_with(".cfg") || lower.ends_with(".cfg.bin") || lower.contains("_patch_")) {
            continue;
        }
        report.files_checked += 1;

        let Some(rel_parts) = game_data_relative(&path) else {
            debug!("Skipping (not in GameData): {}", path.display());
            report.skipped += 1;
            continue;
        };

        if let Some(pos) = file_name.find(STANDARD_MARKER) {
            let original = format!("{}.cfg", &file_name[..pos]);
            let expected = join_parts(&rel_parts[..rel_parts.len().saturating_sub(1)]).join(original);
            check_original(source_dump, &path, PatchKind::Standard, expected, &mut report);
        } else if let Some(caps) = PROTOTYPE_PATCH.captures(file_name) {
            let original_name = caps.get(1).map_or("", |m| m.as_str());
            let parent_matches = rel_parts.len() >= 2
                && rel_parts[rel_parts.len() - 2].eq_ignore_ascii_case(original_name);
            if !parent_matches {
                report.issues.push(LayoutIssue::FolderMismatch {
                    file: path.clone(),
                    expected_folder: original_name.to_string(),
                });
            }
            let upper = rel_parts.len().saturating_sub(2);
            let expected = join_parts(&rel_parts[..upper]).join(format!("{original_name}.cfg"));
            check_original(source_dump, &path, PatchKind::Prototype, expected, &mut report);
        }
    }

    for issue in &report.issues {
        warn!("{}", issue);
    }
    Ok(report)
}

/// Every non-directory entry under `dir`, sorted per directory.
///
/// Symlinked directories are skipped rather than followed.
fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).display().to_string();
            Error::io("walk", path, e.to_string())
        })?;
        if entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir()) {
            continue;
        }
        files.push(entry.into_path());
    }
    Ok(files)
}

fn game_data_relative(path: &Path) -> Option<Vec<String>> {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let index = parts.iter().position(|p| p == GAME_DATA)?;
    Some(parts[index + 1..].to_vec())
}

fn join_parts(parts: &[String]) -> PathBuf {
    parts.iter().collect()
}

fn check_original(
    source_dump: &Path,
    patch: &Path,
    kind: PatchKind,
    expected_rel: PathBuf,
    report: &mut LayoutReport,
) {
    let expected = source_dump.join(expected_rel);
    let mut binary = expected.clone().into_os_string();
    binary.push(".bin");
    if !expected.exists() && !Path::new(&binary).exists() {
        report.issues.push(LayoutIssue::MissingOriginal {
            file: patch.to_path_buf(),
            kind,
            expected,
        });
    }
}
