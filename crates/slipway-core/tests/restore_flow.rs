//! Integration tests for restore with the JSON registry on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use semver::Version;
use slipway_core::fakes::FixtureBuilder;
use slipway_core::{
    BuildOrchestrator, IncrementKind, ProjectManifest, RestoreManager, SlipwayError,
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

/// Run one patch promotion with fixture bytes and return the new version.
async fn build(h: &mut Harness, environment: Environment, script: &[u8]) -> Version {
    let orchestrator = BuildOrchestrator::new(
        h.store.clone(),
        h.layout.clone(),
        Arc::new(FixtureBuilder::new(script.to_vec())),
        h.root(),
    );
    orchestrator
        .promote(
            environment,
            IncrementKind::Patch,
            &mut h.manifest,
            &h.manifest_path,
        )
        .await
        .expect("build failed")
        .version
}

/// Test: restore rewrites the latest slot and moves the pointer
#[tokio::test]
async fn restore_rewrites_latest_and_moves_pointer() {
    let mut h = harness();
    let first = build(&mut h, Environment::Staging, b"one").await;
    let second = build(&mut h, Environment::Staging, b"two").await;
    assert_ne!(first, second);

    let manager = RestoreManager::new(h.store.clone(), h.layout.clone());
    let outcome = manager
        .restore(Environment::Staging, &first)
        .await
        .expect("restore failed");

    assert_eq!(outcome.version, first);
    assert!(!outcome.cascaded_to_staging);

    let latest = h.layout.latest_dir(Environment::Staging);
    assert_eq!(
        std::fs::read(latest.join(SCRIPT_FILE)).expect("restored script"),
        b"one"
    );

    // Pointer moved on disk; both versions stay archived.
    let state = h
        .store
        .load(Environment::Staging)
        .await
        .expect("load registry");
    assert_eq!(state.latest, Some(first.clone()));
    assert_eq!(state.sorted_versions(), vec![first, second]);
}

/// Test: production restore cascades the version into staging
#[tokio::test]
async fn production_restore_cascades_into_staging() {
    let mut h = harness();
    let first = build(&mut h, Environment::Production, b"one").await;
    let _second = build(&mut h, Environment::Production, b"two").await;

    let manager = RestoreManager::new(h.store.clone(), h.layout.clone());
    let outcome = manager
        .restore(Environment::Production, &first)
        .await
        .expect("restore failed");
    assert!(outcome.cascaded_to_staging);

    // Production serves the restored bytes again.
    assert_eq!(
        std::fs::read(
            h.layout
                .latest_dir(Environment::Production)
                .join(SCRIPT_FILE)
        )
        .expect("restored script"),
        b"one"
    );

    // Staging was rewritten to match: latest slot, archive and registry.
    assert_eq!(
        std::fs::read(h.layout.latest_dir(Environment::Staging).join(SCRIPT_FILE))
            .expect("cascaded script"),
        b"one"
    );
    assert!(h
        .layout
        .version_dir(Environment::Staging, &first)
        .join(SCRIPT_FILE)
        .is_file());

    let staging = h
        .store
        .load(Environment::Staging)
        .await
        .expect("staging registry");
    assert_eq!(staging.latest, Some(first.clone()));
    let record = staging.versions.get(&first).expect("cascaded record");
    assert_eq!(record.environment, Environment::Staging);

    // The cascaded record keeps the original timestamp.
    let production = h
        .store
        .load(Environment::Production)
        .await
        .expect("production registry");
    assert_eq!(
        record.timestamp,
        production
            .versions
            .get(&first)
            .expect("source record")
            .timestamp
    );
}

/// Test: staging restore never touches production
#[tokio::test]
async fn staging_restore_leaves_production_alone() {
    let mut h = harness();
    let first = build(&mut h, Environment::Staging, b"one").await;
    let second = build(&mut h, Environment::Staging, b"two").await;
    // Production adopts staging's 0.0.3; the builder is unused on that path.
    let adopted = build(&mut h, Environment::Production, b"unused").await;
    assert_eq!(adopted, second);

    let manager = RestoreManager::new(h.store.clone(), h.layout.clone());
    manager
        .restore(Environment::Staging, &first)
        .await
        .expect("restore failed");

    let production = h
        .store
        .load(Environment::Production)
        .await
        .expect("production registry");
    assert_eq!(production.latest, Some(second));
    assert_eq!(
        std::fs::read(
            h.layout
                .latest_dir(Environment::Production)
                .join(SCRIPT_FILE)
        )
        .expect("production script"),
        b"two"
    );
}

/// Test: restoring an unarchived version reports what is available
#[tokio::test]
async fn restore_unknown_version_lists_archived() {
    let mut h = harness();
    let first = build(&mut h, Environment::Staging, b"one").await;

    let manager = RestoreManager::new(h.store.clone(), h.layout.clone());
    let missing = Version::new(9, 9, 9);
    let err = manager
        .restore(Environment::Staging, &missing)
        .await
        .expect_err("restore should fail");

    // The message carries the inventory for the operator.
    assert!(err.to_string().contains("available: 0.0.2"));
    match err {
        SlipwayError::VersionNotFound {
            environment,
            version,
            available,
        } => {
            assert_eq!(environment, Environment::Staging);
            assert_eq!(version, missing);
            assert_eq!(available, vec![first]);
        }
        other => panic!("expected VersionNotFound, got {other:?}"),
    }
}
