//! In-memory fake for the deploy client (testing only)

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{DeployClient, TransferReceipt};
use crate::error::{CdnError, CdnResult};

// ---------------------------------------------------------------------------
// MemoryDeployClient
// ---------------------------------------------------------------------------

/// Recording fake: remembers every upload and purge, optionally failing them.
#[derive(Debug, Default)]
pub struct MemoryDeployClient {
    uploads: Mutex<Vec<String>>,
    purges: Mutex<Vec<String>>,
    fail_uploads: AtomicBool,
    fail_purges: AtomicBool,
}

impl MemoryDeployClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail with status 500.
    pub fn fail_uploads(&self) {
        self.fail_uploads.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent purge fail with status 500.
    pub fn fail_purges(&self) {
        self.fail_purges.store(true, Ordering::SeqCst);
    }

    /// Remote paths uploaded so far, in completion order.
    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    /// URLs purged so far, in completion order.
    pub fn purged_urls(&self) -> Vec<String> {
        self.purges.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeployClient for MemoryDeployClient {
    async fn upload(&self, local: &Path, remote_path: &str) -> CdnResult<TransferReceipt> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(CdnError::UploadRejected {
                path: remote_path.to_string(),
                status: 500,
            });
        }
        // The local file must exist, as it would for a real upload.
        tokio::fs::read(local).await?;
        self.uploads.lock().unwrap().push(remote_path.to_string());
        Ok(TransferReceipt { status: 201 })
    }

    async fn purge(&self, url: &str) -> CdnResult<TransferReceipt> {
        if self.fail_purges.load(Ordering::SeqCst) {
            return Err(CdnError::PurgeRejected {
                url: url.to_string(),
                status: 500,
            });
        }
        self.purges.lock().unwrap().push(url.to_string());
        Ok(TransferReceipt { status: 200 })
    }
}
