//! Registry trait and data model for Slipway environments
//!
//! The registry tracks, per environment:
//! - `latest`: the version currently loaded into the mutable latest slot
//! - `versions`: every archived version with its metadata record
//!
//! The `VersionStore` trait is async and backend-agnostic. An in-memory fake
//! is provided for testing via the `fakes` module.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::RegistryError;

/// Result type for registry operations
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// A deployment environment.
///
/// Each environment owns a mutable latest slot (`<env>/latest/`) and an
/// append-only archive of versioned snapshots (`<env>/versions/`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Staging,
    Production,
}

impl Environment {
    /// Both environments, staging first.
    pub const ALL: [Environment; 2] = [Environment::Staging, Environment::Production];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = RegistryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(RegistryError::UnknownEnvironment {
                name: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ArtifactDigest
// ---------------------------------------------------------------------------

/// Artifact digest (SHA-256 hex string).
///
/// The inner field is private to guarantee the string is always valid
/// lowercase hex produced by `from_bytes` or validated via `TryFrom<String>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactDigest(String);

impl ArtifactDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha256::new();
        hasher.update(data);
        ArtifactDigest(hex::encode(hasher.finalize()))
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for ArtifactDigest {
    type Error = RegistryError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RegistryError::InvalidDigest { digest: s });
        }
        Ok(ArtifactDigest(s.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for ArtifactDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// VersionRecord
// ---------------------------------------------------------------------------

/// Sizes of the two versioned artifacts, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSizes {
    pub script: u64,
    /// Zero when the build produced no stylesheet.
    pub style: u64,
}

/// Metadata for one archived version. Immutable once written, except that
/// re-archiving the same `(environment, version)` pair overwrites the record
/// wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// The archived version.
    pub version: Version,
    /// Environment the snapshot belongs to.
    pub environment: Environment,
    /// When the snapshot was built.
    pub timestamp: DateTime<Utc>,
    /// Short commit id, or "local" outside version control.
    pub source_commit: String,
    /// Branch name, or "unknown" outside version control.
    pub source_branch: String,
    /// Artifact sizes in bytes.
    pub artifact_sizes: ArtifactSizes,
    /// SHA-256 of the script bundle. Checksums cover the script only.
    pub script_checksum: ArtifactDigest,
}

// ---------------------------------------------------------------------------
// EnvironmentState
// ---------------------------------------------------------------------------

/// Registry state for one environment.
///
/// Invariant: `latest`, if set, is a key of `versions` (an environment never
/// points at an unarchived version).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentState {
    /// Version currently loaded into the latest slot; `None` before any build.
    pub latest: Option<Version>,
    /// Archived versions keyed by version. A `BTreeMap` keyed by
    /// `semver::Version` keeps every listing in semantic-version order.
    pub versions: BTreeMap<Version, VersionRecord>,
}

impl EnvironmentState {
    /// State of a fresh environment: no latest pointer, no versions.
    pub fn empty() -> Self {
        EnvironmentState {
            latest: None,
            versions: BTreeMap::new(),
        }
    }

    /// Archived versions in ascending semantic-version order.
    pub fn sorted_versions(&self) -> Vec<Version> {
        self.versions.keys().cloned().collect()
    }

    /// True when the latest pointer, if set, refers to an archived version.
    pub fn is_consistent(&self) -> bool {
        match &self.latest {
            Some(v) => self.versions.contains_key(v),
            None => true,
        }
    }
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self::empty()
    }
}

// ---------------------------------------------------------------------------
// VersionStore
// ---------------------------------------------------------------------------

/// Per-environment version registry.
///
/// Guarantees:
/// - `load` of a never-saved environment returns the empty state, not an
///   error. A fresh environment is a valid state.
/// - `save` is a full overwrite: last writer wins, no partial merge. Callers
///   serialize their own read-modify-write cycles (one actor per environment).
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Load the registry for an environment.
    async fn load(&self, environment: Environment) -> RegistryResult<EnvironmentState>;

    /// Overwrite the registry for an environment.
    async fn save(&self, environment: Environment, state: &EnvironmentState)
        -> RegistryResult<()>;
}
