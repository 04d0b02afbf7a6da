//! Bunny storage + purge client
//!
//! Uploads artifact files into a Bunny storage zone and purges the matching
//! pull-zone URLs. Credentials come from `BUNNY_*` environment variables;
//! the core depends only on the `DeployClient` trait.

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::{CdnError, CdnResult};

const ENV_STORAGE_NAME: &str = "BUNNY_STORAGE_NAME";
const ENV_STORAGE_KEY: &str = "BUNNY_STORAGE_KEY";
const ENV_STORAGE_REGION: &str = "BUNNY_STORAGE_REGION";
const ENV_API_KEY: &str = "BUNNY_API_KEY";
const ENV_CDN_URL: &str = "BUNNY_CDN_URL";

/// CDN credentials and endpoints.
#[derive(Debug, Clone)]
pub struct CdnConfig {
    /// Storage zone name.
    pub storage_zone: String,
    /// Storage zone password (the upload `AccessKey`).
    pub storage_key: String,
    /// Optional storage region prefix (e.g. "ny", "sg").
    pub region: Option<String>,
    /// Account API key (the purge `AccessKey`).
    pub api_key: String,
    /// Public base URL of the pull zone, without trailing slash.
    pub cdn_url: String,
}

impl CdnConfig {
    /// Read credentials from the environment. A missing required variable is
    /// reported by name; only the region is optional.
    pub fn from_env() -> CdnResult<Self> {
        Ok(CdnConfig {
            storage_zone: require(ENV_STORAGE_NAME)?,
            storage_key: require(ENV_STORAGE_KEY)?,
            region: std::env::var(ENV_STORAGE_REGION)
                .ok()
                .filter(|v| !v.is_empty()),
            api_key: require(ENV_API_KEY)?,
            cdn_url: require(ENV_CDN_URL)?.trim_end_matches('/').to_string(),
        })
    }

    /// Host of the storage endpoint, region-prefixed when configured.
    pub fn storage_host(&self) -> String {
        match &self.region {
            Some(region) => format!("{region}.storage.bunnycdn.com"),
            None => "storage.bunnycdn.com".to_string(),
        }
    }
}

fn require(name: &str) -> CdnResult<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CdnError::MissingCredential {
            name: name.to_string(),
        })
}

/// Content type for an uploaded file, by extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        _ => "application/octet-stream",
    }
}

/// Receipt for a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    /// HTTP status reported by the endpoint.
    pub status: u16,
}

/// Upload/purge client for a CDN.
///
/// Guarantees:
/// - `upload` stores the local file at `remote_path` under the storage zone.
/// - `purge` invalidates one public URL synchronously.
/// - Any non-success status is an error; a partial deploy is surfaced,
///   never hidden.
#[async_trait]
pub trait DeployClient: Send + Sync {
    /// Upload one local file to a zone-relative remote path (forward slashes).
    async fn upload(&self, local: &Path, remote_path: &str) -> CdnResult<TransferReceipt>;

    /// Purge one public URL from the CDN cache.
    async fn purge(&self, url: &str) -> CdnResult<TransferReceipt>;
}

/// Bunny storage + purge API implementation.
pub struct BunnyClient {
    config: CdnConfig,
    http_client: reqwest::Client,
}

impl BunnyClient {
    pub fn new(config: CdnConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent("slipway-cdn/0.1.0")
            .build()
            .expect("Failed to create HTTP client");

        BunnyClient {
            config,
            http_client,
        }
    }

    /// Create a client from `BUNNY_*` environment variables.
    pub fn from_env() -> CdnResult<Self> {
        Ok(Self::new(CdnConfig::from_env()?))
    }

    pub fn config(&self) -> &CdnConfig {
        &self.config
    }
}

#[async_trait]
impl DeployClient for BunnyClient {
    async fn upload(&self, local: &Path, remote_path: &str) -> CdnResult<TransferReceipt> {
        let body = tokio::fs::read(local).await?;
        let url = format!(
            "https://{}/{}/{}",
            self.config.storage_host(),
            self.config.storage_zone,
            remote_path
        );

        debug!(file = %local.display(), remote_path, "uploading to storage zone");

        let response = self
            .http_client
            .put(&url)
            .header("AccessKey", &self.config.storage_key)
            .header("Content-Type", content_type_for(local))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CdnError::UploadRejected {
                path: remote_path.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(TransferReceipt {
            status: status.as_u16(),
        })
    }

    async fn purge(&self, url: &str) -> CdnResult<TransferReceipt> {
        debug!(url, "purging CDN cache");

        let response = self
            .http_client
            .post("https://api.bunny.net/purge")
            .query(&[("url", url), ("async", "false")])
            .header("AccessKey", &self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CdnError::PurgeRejected {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(TransferReceipt {
            status: status.as_u16(),
        })
    }
}
