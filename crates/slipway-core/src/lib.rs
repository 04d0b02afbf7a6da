//! Slipway Core - the dual-environment deployment state machine.
//!
//! This crate owns the promotion policy and every side-effecting stage
//! around it: building, archiving, mirroring, deploying, restoring and
//! resetting. Persistence lives in `slipway-store`, CDN transport in
//! `slipway-cdn`; both arrive here behind traits so the pipeline is
//! testable with in-memory fakes.

pub mod archive;
pub mod builder;
pub mod deploy;
pub mod domain;
pub mod fakes;
pub mod git;
pub mod manifest;
pub mod obs;
pub mod orchestrator;
pub mod reset;
pub mod restore;
pub mod telemetry;

// Re-export main types and errors
pub use archive::ArchiveManager;
pub use builder::{Builder, CommandBuilder};
pub use deploy::{remote_base, DeploySummary, Deployer};
pub use domain::{
    baseline, decide, increment, ArtifactSource, BuildDecision, IncrementKind, Result,
    SlipwayError,
};
pub use git::{capture_source_info, SourceInfo};
pub use manifest::{ProjectManifest, MANIFEST_FILE};
pub use orchestrator::{plan, BuildOrchestrator, PromotionOutcome, PromotionStage};
pub use reset::ResetManager;
pub use restore::{RestoreManager, RestoreOutcome};
pub use telemetry::init_tracing;

/// Version of the slipway-core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
