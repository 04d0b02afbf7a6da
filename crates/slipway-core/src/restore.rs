//! Rolling a latest slot back to an archived version.

use std::path::Path;
use std::sync::Arc;

use semver::Version;
use slipway_store::layout::{DistLayout, SCRIPT_FILE, STYLE_FILE};
use slipway_store::{Environment, VersionRecord, VersionStore};

use crate::domain::error::{Result, SlipwayError};
use crate::obs;

/// Summary of a completed restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub environment: Environment,
    pub version: Version,
    /// Set when a production restore also rewrote staging.
    pub cascaded_to_staging: bool,
}

/// Replaces a latest slot's versioned files with an archived snapshot.
pub struct RestoreManager {
    store: Arc<dyn VersionStore>,
    layout: DistLayout,
}

impl RestoreManager {
    pub fn new(store: Arc<dyn VersionStore>, layout: DistLayout) -> Self {
        RestoreManager { store, layout }
    }

    /// Restore `environment` to `version`.
    ///
    /// Fails with `VersionNotFound`, listing the archived versions, when the
    /// version has no archive directory or no registry record. On success
    /// the latest slot's script and stylesheet are replaced with the
    /// archived copies and the latest pointer rewritten. No new record is
    /// minted, and the assets subtree is never touched.
    ///
    /// Restoring production cascades the same version into staging: latest
    /// slot files, an archive copy and the pointer. Restoring staging never
    /// cascades.
    pub async fn restore(
        &self,
        environment: Environment,
        version: &Version,
    ) -> Result<RestoreOutcome> {
        let mut state = self.store.load(environment).await?;
        let version_dir = self.layout.version_dir(environment, version);

        let record = match state.versions.get(version) {
            Some(record) if version_dir.is_dir() => record.clone(),
            _ => {
                return Err(SlipwayError::VersionNotFound {
                    environment,
                    version: version.clone(),
                    available: state.sorted_versions(),
                })
            }
        };

        let latest_dir = self.layout.latest_dir(environment);
        copy_versioned_files(&version_dir, &latest_dir).await?;

        state.latest = Some(version.clone());
        self.store.save(environment, &state).await?;

        let cascaded = environment == Environment::Production;
        if cascaded {
            self.cascade_to_staging(&version_dir, &record).await?;
        }

        obs::emit_restore_completed(environment, version, cascaded);

        Ok(RestoreOutcome {
            environment,
            version: version.clone(),
            cascaded_to_staging: cascaded,
        })
    }

    /// Rewrite staging to a restored production snapshot. The duplicated
    /// record keeps the snapshot's original build timestamp.
    async fn cascade_to_staging(
        &self,
        production_version_dir: &Path,
        record: &VersionRecord,
    ) -> Result<()> {
        let version = &record.version;

        let staging_latest = self.layout.latest_dir(Environment::Staging);
        copy_versioned_files(production_version_dir, &staging_latest).await?;

        let staging_version_dir = self.layout.version_dir(Environment::Staging, version);
        copy_versioned_files(production_version_dir, &staging_version_dir).await?;

        let mut staging_state = self.store.load(Environment::Staging).await?;
        let mut staging_record = record.clone();
        staging_record.environment = Environment::Staging;
        staging_state
            .versions
            .insert(version.clone(), staging_record);
        staging_state.latest = Some(version.clone());
        self.store.save(Environment::Staging, &staging_state).await?;

        Ok(())
    }
}

/// Copy the script and, when present, the stylesheet from `src` into `dst`.
async fn copy_versioned_files(src: &Path, dst: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dst).await?;
    for file in [SCRIPT_FILE, STYLE_FILE] {
        let from = src.join(file);
        match tokio::fs::copy(&from, dst.join(file)).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
