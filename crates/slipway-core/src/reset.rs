//! Destroying and reinitializing all environment state.

use std::path::Path;
use std::sync::Arc;

use slipway_store::layout::DistLayout;
use slipway_store::{Environment, EnvironmentState, VersionStore};

use crate::domain::error::{Result, SlipwayError};
use crate::manifest::ProjectManifest;
use crate::obs;

/// Wipes the dist tree and reinitializes both environments.
pub struct ResetManager {
    store: Arc<dyn VersionStore>,
    layout: DistLayout,
}

impl ResetManager {
    pub fn new(store: Arc<dyn VersionStore>, layout: DistLayout) -> Self {
        ResetManager { store, layout }
    }

    /// Delete the entire dist tree, recreate the per-environment skeleton
    /// with empty registries, and reset the manifest version to `0.0.1`.
    ///
    /// Fails closed: without `confirmed`, nothing is touched and the error
    /// says how to confirm. This is the only operation that destroys
    /// archived history, and it is all-or-nothing.
    pub async fn reset(
        &self,
        confirmed: bool,
        manifest: &mut ProjectManifest,
        manifest_path: &Path,
    ) -> Result<()> {
        if !confirmed {
            return Err(SlipwayError::Validation(
                "reset destroys all archived versions; pass --yes to confirm".to_string(),
            ));
        }

        match tokio::fs::remove_dir_all(self.layout.root()).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        for environment in Environment::ALL {
            tokio::fs::create_dir_all(self.layout.latest_dir(environment)).await?;
            self.store
                .save(environment, &EnvironmentState::empty())
                .await?;
        }

        manifest.reset_version();
        manifest.save(manifest_path)?;

        obs::emit_reset_completed(self.layout.root());
        Ok(())
    }
}
