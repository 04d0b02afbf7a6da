//! Integration tests for the destructive reset.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use semver::Version;
use slipway_core::fakes::FixtureBuilder;
use slipway_core::{
    BuildOrchestrator, IncrementKind, ProjectManifest, ResetManager, SlipwayError,
};
use slipway_store::layout::SCRIPT_FILE;
use slipway_store::{DistLayout, Environment, JsonVersionStore, VersionStore};

struct Harness {
    dir: tempfile::TempDir,
    store: Arc<JsonVersionStore>,
    layout: DistLayout,
    manifest: ProjectManifest,
    manifest_path: PathBuf,
}

impl Harness {
    fn root(&self) -> &Path {
        self.dir.path()
    }
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = DistLayout::new(dir.path().join("dist"));
    let manifest_path = dir.path().join("slipway.json");
    let manifest = ProjectManifest {
        name: "widget".to_string(),
        version: Version::new(0, 0, 1),
        build_command: vec!["vite".to_string(), "build".to_string()],
    };
    manifest.save(&manifest_path).expect("seed manifest");

    Harness {
        store: Arc::new(JsonVersionStore::new(layout.clone())),
        dir,
        layout,
        manifest,
        manifest_path,
    }
}

async fn build_staging(h: &mut Harness) -> Version {
    let orchestrator = BuildOrchestrator::new(
        h.store.clone(),
        h.layout.clone(),
        Arc::new(FixtureBuilder::new(b"bundle".to_vec())),
        h.root(),
    );
    orchestrator
        .promote(
            Environment::Staging,
            IncrementKind::Patch,
            &mut h.manifest,
            &h.manifest_path,
        )
        .await
        .expect("build failed")
        .version
}

/// Test: an unconfirmed reset is rejected with zero side effects
#[tokio::test]
async fn unconfirmed_reset_is_rejected_without_side_effects() {
    let mut h = harness();
    let built = build_staging(&mut h).await;

    let registry_before =
        std::fs::read(h.layout.registry_path(Environment::Staging)).expect("registry bytes");
    let manifest_before = std::fs::read(&h.manifest_path).expect("manifest bytes");

    let manager = ResetManager::new(h.store.clone(), h.layout.clone());
    let err = manager
        .reset(false, &mut h.manifest, &h.manifest_path)
        .await
        .expect_err("reset must require confirmation");
    assert!(matches!(err, SlipwayError::Validation(_)));
    assert!(err.to_string().contains("--yes"));

    // Byte-for-byte untouched.
    assert_eq!(
        std::fs::read(h.layout.registry_path(Environment::Staging)).expect("registry bytes"),
        registry_before
    );
    assert_eq!(
        std::fs::read(&h.manifest_path).expect("manifest bytes"),
        manifest_before
    );
    assert!(h
        .layout
        .version_dir(Environment::Staging, &built)
        .join(SCRIPT_FILE)
        .is_file());
}

/// Test: a confirmed reset wipes history and reseeds the skeleton
#[tokio::test]
async fn confirmed_reset_wipes_history_and_reseeds() {
    let mut h = harness();
    let built = build_staging(&mut h).await;
    assert_eq!(h.manifest.version, built);

    let manager = ResetManager::new(h.store.clone(), h.layout.clone());
    manager
        .reset(true, &mut h.manifest, &h.manifest_path)
        .await
        .expect("reset failed");

    // Archives are gone, the per-environment skeleton is back.
    assert!(!h.layout.version_dir(Environment::Staging, &built).exists());
    for environment in Environment::ALL {
        assert!(h.layout.latest_dir(environment).is_dir());
        let state = h.store.load(environment).await.expect("load registry");
        assert!(state.versions.is_empty());
        assert_eq!(state.latest, None);
    }

    // The manifest went back to the baseline, in memory and on disk.
    assert_eq!(h.manifest.version, Version::new(0, 0, 1));
    let reloaded = ProjectManifest::load(&h.manifest_path).expect("reload manifest");
    assert_eq!(reloaded.version, Version::new(0, 0, 1));
}
