//! Patch session configuration

use crate::layout;
use crate::{Error, Result};
use cfg_text::Scope;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Settings for one patch-generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Root the `files` paths are relative to (the unpacked game data)
    pub source_root: PathBuf,
    /// Folder holding one directory per mod
    pub mods_root: PathBuf,
    /// Mod name, used in the mod root and in patch file names
    pub mod_name: String,
    /// Source files to load, relative to `source_root`
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Which declarations feed the inheritance graph
    #[serde(default)]
    pub scan_mode: Scope,
    /// Write patches here instead of the traditional mod root
    #[serde(default)]
    pub output_root: Option<PathBuf>,
}

impl SessionConfig {
    pub fn new(
        source_root: impl Into<PathBuf>,
        mods_root: impl Into<PathBuf>,
        mod_name: impl Into<String>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            mods_root: mods_root.into(),
            mod_name: mod_name.into(),
            files: Vec::new(),
            scan_mode: Scope::default(),
            output_root: None,
        }
    }

    /// Set the source files to load
    pub fn files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Set the declaration scan mode
    pub fn scan_mode(mut self, scan_mode: Scope) -> Self {
        self.scan_mode = scan_mode;
        self
    }

    /// Override where patches are written
    pub fn output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = Some(output_root.into());
        self
    }

    /// Load from a YAML (`.yaml`/`.yml`) or JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        trace!("Loading session config from file: {:?}", path);
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io("read", path.display().to_string(), e.to_string()))?;

        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("YAML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("JSON parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject mod names that would escape the output folders
    pub fn validate(&self) -> Result<()> {
        if self.mod_name.trim().is_empty() {
            return Err(Error::Config("mod_name must not be empty".to_string()));
        }
        if self.mod_name.contains(['/', '\\']) || self.mod_name.contains("..") {
            return Err(Error::Config(format!(
                "mod_name '{}' must be a plain folder name",
                self.mod_name
            )));
        }
        Ok(())
    }

    /// Root patches are written under
    pub fn mod_root(&self) -> PathBuf {
        self.output_root
            .clone()
            .unwrap_or_else(|| layout::mod_root(&self.mods_root, &self.mod_name))
    }
}
