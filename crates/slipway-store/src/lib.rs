//! Slipway-Store: Registry Persistence for Slipway
//!
//! This crate provides the persistence layer for the deployment state
//! machine. It owns the registry data model and all I/O with the per
//! environment `versions.json` files.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: registry integrity and the on-disk dist layout.
//!
//! ## Key Components
//!
//! - `Environment`: the two deployment targets, staging and production
//! - `EnvironmentState` / `VersionRecord`: the registry schema
//! - `VersionStore`: async load/save trait over a registry backend
//! - `JsonVersionStore`: the JSON-file backend
//! - `DistLayout`: path conventions for the dist tree

mod error;
pub mod fakes;
mod json_store;
pub mod layout;
pub mod registry_traits;

pub use error::RegistryError;
pub use json_store::JsonVersionStore;
pub use layout::DistLayout;
pub use registry_traits::{
    ArtifactDigest, ArtifactSizes, Environment, EnvironmentState, RegistryResult, VersionRecord,
    VersionStore,
};
