//! The project manifest (`slipway.json`).
//!
//! Holds the single process-wide current version. Each command loads the
//! manifest once and passes the record by reference; nothing reads the file
//! again mid-operation.

use std::io::Write;
use std::path::Path;

use semver::Version;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::domain::error::Result;
use crate::domain::version::baseline;

/// Manifest file name at the project root.
pub const MANIFEST_FILE: &str = "slipway.json";

fn default_build_command() -> Vec<String> {
    vec!["vite".to_string(), "build".to_string()]
}

/// The project manifest record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub name: String,
    /// Current version; the seed for every increment.
    pub version: Version,
    /// Command the builder runs.
    #[serde(default = "default_build_command")]
    pub build_command: Vec<String>,
}

impl ProjectManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let json = serde_json::to_vec_pretty(self)?;

        // Atomic write: write to temp file in the same directory, then rename.
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(&json)?;
        tmp.persist(path).map_err(|e| e.error)?;

        Ok(())
    }

    /// Reset the version to the baseline `0.0.1`.
    pub fn reset_version(&mut self) {
        self.version = baseline();
    }
}
