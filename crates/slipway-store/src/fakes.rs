//! In-memory fakes for the registry trait (testing only)
//!
//! Provides `MemoryVersionStore`, which satisfies the `VersionStore` contract
//! without touching the filesystem.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::registry_traits::{Environment, EnvironmentState, RegistryResult, VersionStore};

// ---------------------------------------------------------------------------
// MemoryVersionStore
// ---------------------------------------------------------------------------

/// In-memory registry backed by a `HashMap<Environment, EnvironmentState>`.
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    states: Mutex<HashMap<Environment, EnvironmentState>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environments that have received at least one save, for asserting
    /// no-op guarantees.
    pub fn saved_environments(&self) -> Vec<Environment> {
        let states = self.states.lock().unwrap();
        let mut environments: Vec<Environment> = states.keys().copied().collect();
        environments.sort_by_key(|e| e.as_str());
        environments
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn load(&self, environment: Environment) -> RegistryResult<EnvironmentState> {
        let states = self.states.lock().unwrap();
        Ok(states
            .get(&environment)
            .cloned()
            .unwrap_or_else(EnvironmentState::empty))
    }

    async fn save(
        &self,
        environment: Environment,
        state: &EnvironmentState,
    ) -> RegistryResult<()> {
        let mut states = self.states.lock().unwrap();
        states.insert(environment, state.clone());
        Ok(())
    }
}
