use thiserror::Error;

/// Errors from the CDN deploy client.
#[derive(Debug, Error)]
pub enum CdnError {
    /// A required credential variable is unset or empty.
    #[error("missing credential: {name} is not set")]
    MissingCredential { name: String },

    /// The storage zone rejected an upload.
    #[error("upload of {path} failed with status {status}")]
    UploadRejected { path: String, status: u16 },

    /// The purge endpoint rejected a request.
    #[error("purge of {url} failed with status {status}")]
    PurgeRejected { url: String, status: u16 },

    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(String),

    /// Local file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for CdnError {
    fn from(err: reqwest::Error) -> Self {
        CdnError::Http(err.to_string())
    }
}

/// Result type for CDN operations
pub type CdnResult<T> = std::result::Result<T, CdnError>;
