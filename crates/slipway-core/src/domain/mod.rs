//! Domain models for Slipway.
//!
//! Canonical definitions for the promotion core:
//! - `IncrementKind` / `increment`: semantic-version bumps
//! - `BuildDecision` / `decide`: the pure promotion policy
//! - `SlipwayError`: the domain error taxonomy

pub mod error;
pub mod policy;
pub mod version;

// Re-export main types and errors
pub use error::{Result, SlipwayError};
pub use policy::{decide, ArtifactSource, BuildDecision};
pub use version::{baseline, increment, IncrementKind};
