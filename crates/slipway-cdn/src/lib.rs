//! Slipway-CDN: Deploy Transport for Slipway
//!
//! Upload and cache-purge client for the Bunny CDN. The core depends only on
//! the `DeployClient` trait, so deploys are testable without network access
//! via the in-memory fake.
//!
//! ## Key Components
//!
//! - `CdnConfig`: credentials read from `BUNNY_*` environment variables
//! - `DeployClient`: async upload/purge trait
//! - `BunnyClient`: the Bunny storage + purge API implementation
//! - `MemoryDeployClient`: recording fake for tests

pub mod client;
mod error;
pub mod fakes;

pub use client::{content_type_for, BunnyClient, CdnConfig, DeployClient, TransferReceipt};
pub use error::{CdnError, CdnResult};
pub use fakes::MemoryDeployClient;
