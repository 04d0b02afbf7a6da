//! Pushing a latest slot to the CDN.
//!
//! Uploads and purges are independent, unordered operations: each group is
//! fired as a concurrent fan-out and joined before the next step. All
//! uploads must succeed before any purge starts, and a single failure
//! aborts the remainder of the deploy.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use slipway_cdn::DeployClient;
use slipway_store::layout::{DistLayout, ASSETS_DIR, SCRIPT_FILE, STYLE_FILE};
use slipway_store::Environment;
use tokio::task::JoinSet;

use crate::domain::error::{Result, SlipwayError};
use crate::obs;

/// Remote path prefix for an environment's latest slot.
///
/// Staging serves from the zone root; production serves from a `latest`
/// subpath.
pub fn remote_base(environment: Environment) -> &'static str {
    match environment {
        Environment::Staging => "staging",
        Environment::Production => "production/latest",
    }
}

/// Summary of a completed deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySummary {
    pub environment: Environment,
    /// Remote paths uploaded, script first, then stylesheet and assets.
    pub uploaded: Vec<String>,
    /// Public URLs purged, same order.
    pub purged: Vec<String>,
}

/// Uploads a latest slot and purges the matching public URLs.
pub struct Deployer {
    client: Arc<dyn DeployClient>,
}

impl Deployer {
    pub fn new(client: Arc<dyn DeployClient>) -> Self {
        Deployer { client }
    }

    /// Deploy `environment`'s latest slot.
    ///
    /// The file set is the script bundle (required), the stylesheet when
    /// present, and every file under `assets/` recursively. A missing
    /// script fails before any upload.
    pub async fn deploy_latest(
        &self,
        layout: &DistLayout,
        environment: Environment,
        cdn_url: &str,
    ) -> Result<DeploySummary> {
        let latest_dir = layout.latest_dir(environment);
        let files = collect_deploy_files(&latest_dir)?;
        let base = remote_base(environment);

        let mut join_set = JoinSet::new();
        for (idx, (local, relative)) in files.iter().cloned().enumerate() {
            let client = Arc::clone(&self.client);
            let remote_path = format!("{base}/{relative}");
            join_set.spawn(async move {
                client.upload(&local, &remote_path).await?;
                Ok::<(usize, String), SlipwayError>((idx, remote_path))
            });
        }

        let mut uploaded: Vec<Option<String>> = vec![None; files.len()];
        while let Some(joined) = join_set.join_next().await {
            let (idx, remote_path) = joined.map_err(|e| SlipwayError::ExternalTool {
                tool: "deploy".to_string(),
                detail: format!("upload task join error: {e}"),
            })??;
            uploaded[idx] = Some(remote_path);
        }
        let uploaded: Vec<String> = uploaded.into_iter().flatten().collect();

        let mut join_set = JoinSet::new();
        for (idx, (_local, relative)) in files.iter().cloned().enumerate() {
            let client = Arc::clone(&self.client);
            let url = format!("{cdn_url}/{base}/{relative}");
            join_set.spawn(async move {
                client.purge(&url).await?;
                Ok::<(usize, String), SlipwayError>((idx, url))
            });
        }

        let mut purged: Vec<Option<String>> = vec![None; files.len()];
        while let Some(joined) = join_set.join_next().await {
            let (idx, url) = joined.map_err(|e| SlipwayError::ExternalTool {
                tool: "deploy".to_string(),
                detail: format!("purge task join error: {e}"),
            })??;
            purged[idx] = Some(url);
        }
        let purged: Vec<String> = purged.into_iter().flatten().collect();

        obs::emit_deploy_completed(environment, uploaded.len(), purged.len());

        Ok(DeploySummary {
            environment,
            uploaded,
            purged,
        })
    }
}

/// Files to deploy from a latest slot, as `(local path, remote suffix)`.
///
/// Asset suffixes keep their `assets/` prefix and always use forward
/// slashes. The listing is sorted with the two bundles first so summaries
/// are deterministic.
fn collect_deploy_files(latest_dir: &Path) -> Result<Vec<(PathBuf, String)>> {
    let script = latest_dir.join(SCRIPT_FILE);
    if !script.is_file() {
        return Err(SlipwayError::MissingArtifact {
            path: script.display().to_string(),
        });
    }

    let mut files = vec![(script, SCRIPT_FILE.to_string())];

    let style = latest_dir.join(STYLE_FILE);
    if style.is_file() {
        files.push((style, STYLE_FILE.to_string()));
    }

    let assets_root = latest_dir.join(ASSETS_DIR);
    if assets_root.is_dir() {
        let mut assets = Vec::new();
        for path in walkdir(&assets_root)? {
            let relative = path
                .strip_prefix(latest_dir)
                .map_err(|e| SlipwayError::Validation(format!("asset outside latest dir: {e}")))?
                .to_string_lossy()
                .replace('\\', "/");
            assets.push((path, relative));
        }
        assets.sort_by(|a, b| a.1.cmp(&b.1));
        files.extend(assets);
    }

    Ok(files)
}

/// Simple directory walker (no external dependency)
fn walkdir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if dir.is_dir() {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                files.extend(walkdir(&path)?);
            } else {
                files.push(path);
            }
        }
    }

    Ok(files)
}
