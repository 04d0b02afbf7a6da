//! Structured observability hooks for Slipway lifecycle events.
//!
//! Emission functions for the key moments of a command: the promotion
//! decision and its stages, archive/restore/reset/deploy completions, and
//! the manifest-divergence warning.
//!
//! Events are emitted at `info!` level; filtering goes through `RUST_LOG`.

use std::path::Path;

use semver::Version;
use slipway_store::{ArtifactDigest, Environment};
use tracing::{info, warn};

use crate::domain::policy::BuildDecision;

/// Emit event: promotion decision taken.
pub fn emit_promotion_decided(environment: Environment, decision: &BuildDecision) {
    info!(
        event = "promotion.decided",
        environment = %environment,
        next_version = %decision.next_version,
        source = ?decision.source,
        mirror_to_staging = decision.mirror_to_staging,
    );
}

/// Emit event: one promotion stage started.
pub fn emit_stage_started(stage: &str, environment: Environment) {
    info!(event = "stage.started", stage = %stage, environment = %environment);
}

/// Emit event: one promotion stage completed.
pub fn emit_stage_completed(stage: &str, environment: Environment, duration_ms: u64) {
    info!(
        event = "stage.completed",
        stage = %stage,
        environment = %environment,
        duration_ms = duration_ms,
    );
}

/// Emit event: promotion finished.
pub fn emit_promotion_completed(environment: Environment, version: &Version, deployed: bool) {
    info!(
        event = "promotion.completed",
        environment = %environment,
        version = %version,
        deployed = deployed,
    );
}

/// Emit event: a version snapshot was archived.
pub fn emit_archive_completed(
    environment: Environment,
    version: &Version,
    checksum: &ArtifactDigest,
) {
    info!(
        event = "archive.completed",
        environment = %environment,
        version = %version,
        checksum = %checksum.short(),
    );
}

/// Emit event: restore finished.
pub fn emit_restore_completed(environment: Environment, version: &Version, cascaded: bool) {
    info!(
        event = "restore.completed",
        environment = %environment,
        version = %version,
        cascaded = cascaded,
    );
}

/// Emit event: reset finished.
pub fn emit_reset_completed(dist_root: &Path) {
    info!(event = "reset.completed", dist_root = %dist_root.display());
}

/// Emit event: deploy finished.
pub fn emit_deploy_completed(environment: Environment, uploaded: usize, purged: usize) {
    info!(
        event = "deploy.completed",
        environment = %environment,
        uploaded = uploaded,
        purged = purged,
    );
}

/// Emit warning: a stage failed after the manifest bump, leaving the
/// manifest version ahead of the registry. Not repaired automatically;
/// operators reconcile by hand.
pub fn emit_manifest_divergence(
    environment: Environment,
    manifest_version: &Version,
    archived_latest: Option<&Version>,
) {
    let archived = archived_latest
        .map(|v| v.to_string())
        .unwrap_or_else(|| "none".to_string());
    warn!(
        event = "promotion.manifest_divergence",
        environment = %environment,
        manifest_version = %manifest_version,
        archived_latest = %archived,
    );
}
