//! The external builder collaborator.
//!
//! A build populates a target directory with the script bundle, the
//! stylesheet bundle and optionally an assets subtree. The subprocess
//! implementation hands the target directory to the bundler via the
//! `SLIPWAY_OUT_DIR` environment variable.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::error::{Result, SlipwayError};

/// Produces the artifact set for one environment's latest slot.
#[async_trait]
pub trait Builder: Send + Sync {
    /// Build into `out_dir`. On success the directory holds at least the
    /// script bundle. Non-zero exit is fatal to the current operation.
    async fn build(&self, out_dir: &Path) -> Result<()>;
}

/// Runs the manifest's build command as a subprocess.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    command: Vec<String>,
    timeout_secs: u64,
}

impl CommandBuilder {
    /// Default ceiling for one bundler run.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

    pub fn new(command: Vec<String>) -> Self {
        CommandBuilder {
            command,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the timeout; `0` disables it.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[async_trait]
impl Builder for CommandBuilder {
    async fn build(&self, out_dir: &Path) -> Result<()> {
        if self.command.is_empty() {
            return Err(SlipwayError::Validation(
                "build command is empty".to_string(),
            ));
        }

        let start = Instant::now();
        let exe = &self.command[0];
        let args = &self.command[1..];

        tokio::fs::create_dir_all(out_dir).await?;

        let child = Command::new(exe)
            .args(args)
            .env("SLIPWAY_OUT_DIR", out_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SlipwayError::ExternalTool {
                tool: "builder".to_string(),
                detail: format!("failed to spawn {exe}: {e}"),
            })?;

        let output = if self.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(self.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| SlipwayError::ExternalTool {
                tool: "builder".to_string(),
                detail: format!("timed out after {} seconds", self.timeout_secs),
            })??
        } else {
            child.wait_with_output().await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SlipwayError::ExternalTool {
                tool: "builder".to_string(),
                detail: format!("exit code {exit_code}: {}", stderr.trim()),
            });
        }

        debug!(duration_ms, out_dir = %out_dir.display(), "builder finished");
        Ok(())
    }
}
