//! Snapshotting a latest slot into the immutable version history.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use semver::Version;
use slipway_store::layout::{DistLayout, SCRIPT_FILE, STYLE_FILE};
use slipway_store::{ArtifactDigest, ArtifactSizes, Environment, VersionRecord, VersionStore};

use crate::domain::error::{Result, SlipwayError};
use crate::git::SourceInfo;
use crate::obs;

/// Copies a latest slot's versioned files into `versions/v<version>` and
/// records the snapshot in the registry.
pub struct ArchiveManager {
    store: Arc<dyn VersionStore>,
    layout: DistLayout,
}

impl ArchiveManager {
    pub fn new(store: Arc<dyn VersionStore>, layout: DistLayout) -> Self {
        ArchiveManager { store, layout }
    }

    /// Archive the artifacts in `latest_dir` as `version`.
    ///
    /// The script bundle must exist; the stylesheet is optional (a
    /// stylesheet-less build records size 0). Only those two files are
    /// copied; the assets subtree stays in the latest slot. Re-archiving an
    /// existing `(environment, version)` pair overwrites its files and its
    /// record; the registry holds one record per version key.
    ///
    /// On success the environment's latest pointer moves to `version`, so
    /// the pointer always refers to an archived version.
    pub async fn archive(
        &self,
        environment: Environment,
        version: &Version,
        latest_dir: &Path,
        source: &SourceInfo,
    ) -> Result<VersionRecord> {
        let script_src = latest_dir.join(SCRIPT_FILE);
        let script = tokio::fs::read(&script_src).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SlipwayError::MissingArtifact {
                    path: script_src.display().to_string(),
                }
            } else {
                SlipwayError::Io(e)
            }
        })?;

        let version_dir = self.layout.version_dir(environment, version);
        tokio::fs::create_dir_all(&version_dir).await?;
        tokio::fs::write(version_dir.join(SCRIPT_FILE), &script).await?;

        let style_src = latest_dir.join(STYLE_FILE);
        let style_size = match tokio::fs::read(&style_src).await {
            Ok(style) => {
                tokio::fs::write(version_dir.join(STYLE_FILE), &style).await?;
                style.len() as u64
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let record = VersionRecord {
            version: version.clone(),
            environment,
            timestamp: Utc::now(),
            source_commit: source.commit.clone(),
            source_branch: source.branch.clone(),
            artifact_sizes: ArtifactSizes {
                script: script.len() as u64,
                style: style_size,
            },
            script_checksum: ArtifactDigest::from_bytes(&script),
        };

        let mut state = self.store.load(environment).await?;
        state.versions.insert(version.clone(), record.clone());
        state.latest = Some(version.clone());
        self.store.save(environment, &state).await?;

        obs::emit_archive_completed(environment, version, &record.script_checksum);

        Ok(record)
    }
}
