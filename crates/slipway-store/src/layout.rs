//! On-disk layout of the dist tree.

use std::path::{Path, PathBuf};

use semver::Version;

use crate::registry_traits::Environment;

/// Script bundle file name inside a latest slot or a version archive.
pub const SCRIPT_FILE: &str = "app.js";
/// Stylesheet bundle file name.
pub const STYLE_FILE: &str = "app.css";
/// Unversioned assets subtree under a latest slot.
pub const ASSETS_DIR: &str = "assets";
/// Per-environment registry file name.
pub const REGISTRY_FILE: &str = "versions.json";

/// Path helpers for the dist tree.
///
/// ```text
/// <root>/<env>/latest/app.js         mutable latest slot
/// <root>/<env>/latest/app.css
/// <root>/<env>/latest/assets/**      unversioned, never archived
/// <root>/<env>/versions/v<version>/  immutable snapshot (two files only)
/// <root>/<env>/versions/versions.json
/// ```
#[derive(Debug, Clone)]
pub struct DistLayout {
    root: PathBuf,
}

impl DistLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DistLayout { root: root.into() }
    }

    /// The dist root itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn env_dir(&self, environment: Environment) -> PathBuf {
        self.root.join(environment.as_str())
    }

    /// The environment's mutable latest slot.
    pub fn latest_dir(&self, environment: Environment) -> PathBuf {
        self.env_dir(environment).join("latest")
    }

    /// Directory holding the archives and the registry file.
    pub fn archive_root(&self, environment: Environment) -> PathBuf {
        self.env_dir(environment).join("versions")
    }

    /// Archive directory for one version (`versions/v<version>`).
    pub fn version_dir(&self, environment: Environment, version: &Version) -> PathBuf {
        self.archive_root(environment).join(format!("v{version}"))
    }

    pub fn registry_path(&self, environment: Environment) -> PathBuf {
        self.archive_root(environment).join(REGISTRY_FILE)
    }
}
