use thiserror::Error;

/// Errors from registry persistence operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Environment name is neither "staging" nor "production".
    #[error("unknown environment '{name}' (expected staging or production)")]
    UnknownEnvironment { name: String },

    /// Digest string is not 64 hex characters.
    #[error("invalid digest: {digest}")]
    InvalidDigest { digest: String },

    /// Registry file could not be (de)serialized.
    #[error("registry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure while reading or writing a registry.
    #[error("registry io error: {0}")]
    Io(#[from] std::io::Error),
}
