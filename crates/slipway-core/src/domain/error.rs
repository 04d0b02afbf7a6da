//! Domain-level error taxonomy for Slipway.

use semver::Version;
use slipway_store::Environment;

/// Slipway domain errors.
#[derive(Debug, thiserror::Error)]
pub enum SlipwayError {
    /// Caller input rejected before any side effect.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested version has no archive in the environment. Carries the
    /// archived versions so callers can print the valid alternatives.
    #[error(
        "version {version} not found in {environment} (available: {})",
        format_versions(.available)
    )]
    VersionNotFound {
        environment: Environment,
        version: Version,
        available: Vec<Version>,
    },

    /// A required artifact file is absent.
    #[error("missing artifact: {path}")]
    MissingArtifact { path: String },

    /// An external collaborator failed (builder, deploy client, git).
    #[error("{tool} failed: {detail}")]
    ExternalTool { tool: String, detail: String },

    #[error("registry error: {0}")]
    Registry(#[from] slipway_store::RegistryError),

    #[error("cdn error: {0}")]
    Cdn(#[from] slipway_cdn::CdnError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_versions(versions: &[Version]) -> String {
    if versions.is_empty() {
        "none".to_string()
    } else {
        versions
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Result type for Slipway domain operations.
pub type Result<T> = std::result::Result<T, SlipwayError>;
