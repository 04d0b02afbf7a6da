use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::RegistryError;
use crate::layout::DistLayout;
use crate::registry_traits::{Environment, EnvironmentState, RegistryResult, VersionStore};

/// JSON-file registry store: one `versions.json` per environment.
///
/// Loading a registry that does not exist yet returns the empty state, so a
/// fresh checkout works without any initialization step. Saves rewrite the
/// whole file through a temp file in the same directory.
#[derive(Debug, Clone)]
pub struct JsonVersionStore {
    layout: DistLayout,
}

impl JsonVersionStore {
    pub fn new(layout: DistLayout) -> Self {
        JsonVersionStore { layout }
    }

    fn registry_parent(&self, environment: Environment) -> PathBuf {
        self.layout.archive_root(environment)
    }
}

#[async_trait]
impl VersionStore for JsonVersionStore {
    async fn load(&self, environment: Environment) -> RegistryResult<EnvironmentState> {
        let path = self.layout.registry_path(environment);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(registry = %path.display(), "no registry file, starting empty");
                Ok(EnvironmentState::empty())
            }
            Err(e) => Err(RegistryError::Io(e)),
        }
    }

    async fn save(
        &self,
        environment: Environment,
        state: &EnvironmentState,
    ) -> RegistryResult<()> {
        let parent = self.registry_parent(environment);
        tokio::fs::create_dir_all(&parent).await?;

        let json = serde_json::to_vec_pretty(state)?;
        let path = self.layout.registry_path(environment);

        // Atomic write: write to temp file in the same directory, then rename.
        let mut tmp = NamedTempFile::new_in(&parent)?;
        tmp.write_all(&json)?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(registry = %path.display(), versions = state.versions.len(), "registry saved");
        Ok(())
    }
}
