//! The staged promotion pipeline.
//!
//! A promotion turns a policy decision into an ordered stage list and runs
//! it. Stages execute strictly in order and the first failure aborts the
//! rest. The manifest bump is the first stage, so a later failure leaves
//! the manifest version ahead of the registry; that divergence is logged
//! and left for operators to reconcile.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use semver::Version;
use slipway_store::layout::{ASSETS_DIR, SCRIPT_FILE, STYLE_FILE};
use slipway_store::{DistLayout, Environment, VersionStore};

use crate::archive::ArchiveManager;
use crate::builder::Builder;
use crate::deploy::{DeploySummary, Deployer};
use crate::domain::error::{Result, SlipwayError};
use crate::domain::policy::{self, ArtifactSource, BuildDecision};
use crate::domain::version::IncrementKind;
use crate::git::{self, SourceInfo};
use crate::manifest::ProjectManifest;
use crate::obs;

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// One step of a promotion plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionStage {
    /// Persist the next version into the project manifest.
    BumpManifest,
    /// Run the builder into the target latest slot.
    Build,
    /// Byte-copy staging's latest output into production's latest slot.
    Adopt,
    /// Snapshot the target latest slot into the version history.
    Archive,
    /// Copy the fresh production output into staging and archive it there.
    MirrorToStaging,
    /// Upload the latest slot to the CDN and purge the public URLs.
    Deploy,
}

impl PromotionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionStage::BumpManifest => "bump_manifest",
            PromotionStage::Build => "build",
            PromotionStage::Adopt => "adopt",
            PromotionStage::Archive => "archive",
            PromotionStage::MirrorToStaging => "mirror_to_staging",
            PromotionStage::Deploy => "deploy",
        }
    }
}

/// Ordered stage list for a decision.
///
/// The bump always comes first and the archive always follows the artifact
/// stage, so every archived version was announced in the manifest before
/// its bytes existed. The deploy stage is appended only when a deploy
/// target is configured.
pub fn plan(decision: &BuildDecision, deploy: bool) -> Vec<PromotionStage> {
    let mut stages = vec![PromotionStage::BumpManifest];
    match decision.source {
        ArtifactSource::Rebuild => stages.push(PromotionStage::Build),
        ArtifactSource::Adopt => stages.push(PromotionStage::Adopt),
    }
    stages.push(PromotionStage::Archive);
    if decision.mirror_to_staging {
        stages.push(PromotionStage::MirrorToStaging);
    }
    if deploy {
        stages.push(PromotionStage::Deploy);
    }
    stages
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Result of a completed promotion.
#[derive(Debug)]
pub struct PromotionOutcome {
    pub environment: Environment,
    /// Version the environment now serves.
    pub version: Version,
    pub decision: BuildDecision,
    pub stages: Vec<PromotionStage>,
    /// Deploy summaries; the requested environment first, staging second
    /// when the mirror stage ran.
    pub deploys: Vec<DeploySummary>,
}

/// Where the deploy stage pushes to.
pub struct DeployTarget {
    pub deployer: Deployer,
    pub cdn_url: String,
}

/// Drives one promotion end to end.
pub struct BuildOrchestrator {
    store: Arc<dyn VersionStore>,
    layout: DistLayout,
    builder: Arc<dyn Builder>,
    deploy: Option<DeployTarget>,
    project_root: PathBuf,
}

impl BuildOrchestrator {
    pub fn new(
        store: Arc<dyn VersionStore>,
        layout: DistLayout,
        builder: Arc<dyn Builder>,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        BuildOrchestrator {
            store,
            layout,
            builder,
            deploy: None,
            project_root: project_root.into(),
        }
    }

    /// Attach a deploy target; without one the deploy stage is skipped.
    pub fn with_deploy(mut self, deployer: Deployer, cdn_url: impl Into<String>) -> Self {
        self.deploy = Some(DeployTarget {
            deployer,
            cdn_url: cdn_url.into(),
        });
        self
    }

    /// Run one promotion for `environment`.
    ///
    /// Loads both registries, takes the policy decision against the
    /// manifest's current version, then executes the planned stages in
    /// order. On success the manifest holds the promoted version and the
    /// registry's latest pointer matches it.
    pub async fn promote(
        &self,
        environment: Environment,
        kind: IncrementKind,
        manifest: &mut ProjectManifest,
        manifest_path: &Path,
    ) -> Result<PromotionOutcome> {
        let staging = self.store.load(Environment::Staging).await?;
        let production = self.store.load(Environment::Production).await?;
        let staging_artifacts_present = self
            .layout
            .latest_dir(Environment::Staging)
            .join(SCRIPT_FILE)
            .is_file();

        let decision = policy::decide(
            environment,
            kind,
            &manifest.version,
            staging.latest.as_ref(),
            production.latest.as_ref(),
            staging_artifacts_present,
        );
        obs::emit_promotion_decided(environment, &decision);

        let archived_before = match environment {
            Environment::Staging => staging.latest,
            Environment::Production => production.latest,
        };
        let source = git::capture_source_info(&self.project_root);
        let stages = plan(&decision, self.deploy.is_some());
        let mut deploys = Vec::new();

        for stage in &stages {
            obs::emit_stage_started(stage.as_str(), environment);
            let start = Instant::now();

            let result = self
                .run_stage(
                    *stage,
                    environment,
                    &decision,
                    manifest,
                    manifest_path,
                    &source,
                    &mut deploys,
                )
                .await;

            if let Err(e) = result {
                if matches!(stage, PromotionStage::Build | PromotionStage::Adopt) {
                    // The bump already landed but nothing was archived.
                    obs::emit_manifest_divergence(
                        environment,
                        &manifest.version,
                        archived_before.as_ref(),
                    );
                }
                return Err(e);
            }

            obs::emit_stage_completed(
                stage.as_str(),
                environment,
                start.elapsed().as_millis() as u64,
            );
        }

        obs::emit_promotion_completed(environment, &decision.next_version, !deploys.is_empty());

        Ok(PromotionOutcome {
            environment,
            version: decision.next_version.clone(),
            decision,
            stages,
            deploys,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_stage(
        &self,
        stage: PromotionStage,
        environment: Environment,
        decision: &BuildDecision,
        manifest: &mut ProjectManifest,
        manifest_path: &Path,
        source: &SourceInfo,
        deploys: &mut Vec<DeploySummary>,
    ) -> Result<()> {
        match stage {
            PromotionStage::BumpManifest => {
                manifest.version = decision.next_version.clone();
                manifest.save(manifest_path)
            }
            PromotionStage::Build => {
                self.builder
                    .build(&self.layout.latest_dir(environment))
                    .await
            }
            PromotionStage::Adopt => self.adopt_staging_output().await,
            PromotionStage::Archive => {
                let latest_dir = self.layout.latest_dir(environment);
                ArchiveManager::new(Arc::clone(&self.store), self.layout.clone())
                    .archive(environment, &decision.next_version, &latest_dir, source)
                    .await
                    .map(|_| ())
            }
            PromotionStage::MirrorToStaging => {
                self.mirror_to_staging(&decision.next_version, source).await
            }
            PromotionStage::Deploy => {
                self.run_deploys(environment, decision.mirror_to_staging, deploys)
                    .await
            }
        }
    }

    /// Byte-copy staging's latest output into production's latest slot.
    async fn adopt_staging_output(&self) -> Result<()> {
        let staging = self.layout.latest_dir(Environment::Staging);
        let script = staging.join(SCRIPT_FILE);
        if !script.is_file() {
            return Err(SlipwayError::MissingArtifact {
                path: script.display().to_string(),
            });
        }
        copy_latest_slot(&staging, &self.layout.latest_dir(Environment::Production)).await
    }

    /// Copy the freshly built production output into staging's latest slot
    /// and archive the same version there, keeping the environments in
    /// lockstep.
    async fn mirror_to_staging(&self, version: &Version, source: &SourceInfo) -> Result<()> {
        let production = self.layout.latest_dir(Environment::Production);
        let staging = self.layout.latest_dir(Environment::Staging);
        copy_latest_slot(&production, &staging).await?;

        ArchiveManager::new(Arc::clone(&self.store), self.layout.clone())
            .archive(Environment::Staging, version, &staging, source)
            .await?;
        Ok(())
    }

    async fn run_deploys(
        &self,
        environment: Environment,
        mirror: bool,
        deploys: &mut Vec<DeploySummary>,
    ) -> Result<()> {
        if let Some(target) = &self.deploy {
            deploys.push(
                target
                    .deployer
                    .deploy_latest(&self.layout, environment, &target.cdn_url)
                    .await?,
            );
            if mirror {
                deploys.push(
                    target
                        .deployer
                        .deploy_latest(&self.layout, Environment::Staging, &target.cdn_url)
                        .await?,
                );
            }
        }
        Ok(())
    }
}

/// Copy a latest slot wholesale: both bundles plus the assets subtree.
/// A missing stylesheet or assets directory is skipped, not an error.
async fn copy_latest_slot(src: &Path, dst: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dst).await?;
    for file in [SCRIPT_FILE, STYLE_FILE] {
        match tokio::fs::copy(src.join(file), dst.join(file)).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    let assets = src.join(ASSETS_DIR);
    if assets.is_dir() {
        copy_tree(&assets, &dst.join(ASSETS_DIR))?;
    }
    Ok(())
}

/// Recursive directory copy.
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        if path.is_dir() {
            copy_tree(&path, &target)?;
        } else {
            std::fs::copy(&path, &target)?;
        }
    }
    Ok(())
}
