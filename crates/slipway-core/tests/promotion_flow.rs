//! Integration tests for the promotion pipeline with in-memory fakes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use semver::Version;
use slipway_cdn::fakes::MemoryDeployClient;
use slipway_core::fakes::{FailingBuilder, FixtureBuilder};
use slipway_core::{
    ArtifactSource, BuildOrchestrator, Deployer, IncrementKind, ProjectManifest, PromotionStage,
    SlipwayError,
};
use slipway_store::fakes::MemoryVersionStore;
use slipway_store::layout::{SCRIPT_FILE, STYLE_FILE};
use slipway_store::{DistLayout, Environment, VersionStore};

struct Harness {
    dir: tempfile::TempDir,
    store: Arc<MemoryVersionStore>,
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
        dir,
        store: Arc::new(MemoryVersionStore::new()),
        layout,
        manifest,
        manifest_path,
    }
}

/// Test: first staging build bumps the manifest, builds and archives
#[tokio::test]
async fn staging_build_archives_the_bumped_version() {
    let mut h = harness();
    let builder =
        Arc::new(FixtureBuilder::new(b"console.log(1)".to_vec()).with_style(b"body{}".to_vec()));
    let orchestrator =
        BuildOrchestrator::new(h.store.clone(), h.layout.clone(), builder, h.root());

    let outcome = orchestrator
        .promote(
            Environment::Staging,
            IncrementKind::Patch,
            &mut h.manifest,
            &h.manifest_path,
        )
        .await
        .expect("staging build failed");

    assert_eq!(outcome.version, Version::new(0, 0, 2));
    assert_eq!(outcome.decision.source, ArtifactSource::Rebuild);
    assert_eq!(
        outcome.stages,
        vec![
            PromotionStage::BumpManifest,
            PromotionStage::Build,
            PromotionStage::Archive,
        ]
    );

    // The bump was persisted before the build ran.
    let reloaded = ProjectManifest::load(&h.manifest_path).expect("reload manifest");
    assert_eq!(reloaded.version, Version::new(0, 0, 2));

    let state = h
        .store
        .load(Environment::Staging)
        .await
        .expect("load registry");
    assert_eq!(state.latest, Some(Version::new(0, 0, 2)));
    assert!(state.versions.contains_key(&Version::new(0, 0, 2)));

    let archived = h
        .layout
        .version_dir(Environment::Staging, &Version::new(0, 0, 2));
    assert_eq!(
        std::fs::read(archived.join(SCRIPT_FILE)).expect("archived script"),
        b"console.log(1)"
    );
    assert_eq!(
        std::fs::read(archived.join(STYLE_FILE)).expect("archived style"),
        b"body{}"
    );
}

/// Test: production adopts staging's newer output without rebuilding
#[tokio::test]
async fn production_adopts_staging_output_without_rebuilding() {
    let mut h = harness();
    let staging = BuildOrchestrator::new(
        h.store.clone(),
        h.layout.clone(),
        Arc::new(FixtureBuilder::new(b"staging-bundle".to_vec())),
        h.root(),
    );
    staging
        .promote(
            Environment::Staging,
            IncrementKind::Minor,
            &mut h.manifest,
            &h.manifest_path,
        )
        .await
        .expect("staging build failed");

    // A failing builder proves the adopt path never rebuilds.
    let production = BuildOrchestrator::new(
        h.store.clone(),
        h.layout.clone(),
        Arc::new(FailingBuilder),
        h.root(),
    );
    let outcome = production
        .promote(
            Environment::Production,
            IncrementKind::Patch,
            &mut h.manifest,
            &h.manifest_path,
        )
        .await
        .expect("adopt failed");

    assert_eq!(outcome.decision.source, ArtifactSource::Adopt);
    assert_eq!(outcome.version, Version::new(0, 1, 0), "production moves to staging's version");
    assert_eq!(h.manifest.version, Version::new(0, 1, 0));

    let latest = h.layout.latest_dir(Environment::Production);
    assert_eq!(
        std::fs::read(latest.join(SCRIPT_FILE)).expect("adopted script"),
        b"staging-bundle"
    );

    let state = h
        .store
        .load(Environment::Production)
        .await
        .expect("load registry");
    assert_eq!(state.latest, Some(Version::new(0, 1, 0)));
}

/// Test: adoption carries the assets subtree byte for byte
#[tokio::test]
async fn adoption_carries_the_assets_subtree() {
    let mut h = harness();
    let staging = BuildOrchestrator::new(
        h.store.clone(),
        h.layout.clone(),
        Arc::new(FixtureBuilder::new(b"bundle".to_vec())),
        h.root(),
    );
    staging
        .promote(
            Environment::Staging,
            IncrementKind::Patch,
            &mut h.manifest,
            &h.manifest_path,
        )
        .await
        .expect("staging build failed");

    let assets = h.layout.latest_dir(Environment::Staging).join("assets/img");
    std::fs::create_dir_all(&assets).expect("assets dir");
    std::fs::write(assets.join("logo.svg"), b"<svg/>").expect("asset");

    let production = BuildOrchestrator::new(
        h.store.clone(),
        h.layout.clone(),
        Arc::new(FailingBuilder),
        h.root(),
    );
    production
        .promote(
            Environment::Production,
            IncrementKind::Patch,
            &mut h.manifest,
            &h.manifest_path,
        )
        .await
        .expect("adopt failed");

    let adopted = h
        .layout
        .latest_dir(Environment::Production)
        .join("assets/img/logo.svg");
    assert_eq!(std::fs::read(adopted).expect("adopted asset"), b"<svg/>");
}

/// Test: a lockstep production build mirrors artifacts and registry to staging
#[tokio::test]
async fn lockstep_production_build_mirrors_to_staging() {
    let mut h = harness();
    // Reach lockstep: build staging, then let production adopt it.
    let seed = BuildOrchestrator::new(
        h.store.clone(),
        h.layout.clone(),
        Arc::new(FixtureBuilder::new(b"v1".to_vec())),
        h.root(),
    );
    seed.promote(
        Environment::Staging,
        IncrementKind::Patch,
        &mut h.manifest,
        &h.manifest_path,
    )
    .await
    .expect("staging build failed");
    seed.promote(
        Environment::Production,
        IncrementKind::Patch,
        &mut h.manifest,
        &h.manifest_path,
    )
    .await
    .expect("adopt failed");

    let rebuilt = BuildOrchestrator::new(
        h.store.clone(),
        h.layout.clone(),
        Arc::new(FixtureBuilder::new(b"v2".to_vec())),
        h.root(),
    );
    let outcome = rebuilt
        .promote(
            Environment::Production,
            IncrementKind::Patch,
            &mut h.manifest,
            &h.manifest_path,
        )
        .await
        .expect("lockstep build failed");

    assert_eq!(outcome.version, Version::new(0, 0, 3));
    assert_eq!(outcome.decision.source, ArtifactSource::Rebuild);
    assert!(outcome.decision.mirror_to_staging);
    assert!(outcome.stages.contains(&PromotionStage::MirrorToStaging));

    // Both registries advanced in lockstep.
    let staging = h
        .store
        .load(Environment::Staging)
        .await
        .expect("staging registry");
    let production = h
        .store
        .load(Environment::Production)
        .await
        .expect("production registry");
    assert_eq!(staging.latest, Some(Version::new(0, 0, 3)));
    assert_eq!(production.latest, Some(Version::new(0, 0, 3)));

    // Staging's latest slot serves the same bytes, and both sides archived.
    assert_eq!(
        std::fs::read(h.layout.latest_dir(Environment::Staging).join(SCRIPT_FILE))
            .expect("mirrored script"),
        b"v2"
    );
    assert!(h
        .layout
        .version_dir(Environment::Staging, &Version::new(0, 0, 3))
        .join(SCRIPT_FILE)
        .is_file());
    assert!(h
        .layout
        .version_dir(Environment::Production, &Version::new(0, 0, 3))
        .join(SCRIPT_FILE)
        .is_file());
}

/// Test: a solo production build increments and leaves staging untouched
#[tokio::test]
async fn solo_production_build_leaves_staging_untouched() {
    let mut h = harness();
    let orchestrator = BuildOrchestrator::new(
        h.store.clone(),
        h.layout.clone(),
        Arc::new(FixtureBuilder::new(b"prod-only".to_vec())),
        h.root(),
    );

    let outcome = orchestrator
        .promote(
            Environment::Production,
            IncrementKind::Patch,
            &mut h.manifest,
            &h.manifest_path,
        )
        .await
        .expect("solo build failed");

    assert_eq!(outcome.version, Version::new(0, 0, 2));
    assert_eq!(outcome.decision.source, ArtifactSource::Rebuild);
    assert!(!outcome.decision.mirror_to_staging);

    let staging = h
        .store
        .load(Environment::Staging)
        .await
        .expect("staging registry");
    assert!(staging.versions.is_empty(), "staging registry should be untouched");
    assert!(!h
        .layout
        .latest_dir(Environment::Staging)
        .join(SCRIPT_FILE)
        .exists());
}

/// Test: a build failure after the bump leaves the manifest ahead of the registry
#[tokio::test]
async fn failed_build_leaves_manifest_ahead_of_registry() {
    let mut h = harness();
    let orchestrator = BuildOrchestrator::new(
        h.store.clone(),
        h.layout.clone(),
        Arc::new(FailingBuilder),
        h.root(),
    );

    let err = orchestrator
        .promote(
            Environment::Staging,
            IncrementKind::Patch,
            &mut h.manifest,
            &h.manifest_path,
        )
        .await
        .expect_err("build should fail");
    assert!(matches!(err, SlipwayError::ExternalTool { .. }));

    // The bump is persisted, the registry is not.
    let reloaded = ProjectManifest::load(&h.manifest_path).expect("reload manifest");
    assert_eq!(reloaded.version, Version::new(0, 0, 2));

    let state = h
        .store
        .load(Environment::Staging)
        .await
        .expect("load registry");
    assert!(state.versions.is_empty());
    assert_eq!(state.latest, None);
}

/// Test: with a deploy target a lockstep build deploys production then staging
#[tokio::test]
async fn lockstep_build_deploys_both_environments() {
    let mut h = harness();
    // Reach lockstep first.
    let seed = BuildOrchestrator::new(
        h.store.clone(),
        h.layout.clone(),
        Arc::new(FixtureBuilder::new(b"v1".to_vec())),
        h.root(),
    );
    seed.promote(
        Environment::Staging,
        IncrementKind::Patch,
        &mut h.manifest,
        &h.manifest_path,
    )
    .await
    .expect("staging build failed");
    seed.promote(
        Environment::Production,
        IncrementKind::Patch,
        &mut h.manifest,
        &h.manifest_path,
    )
    .await
    .expect("adopt failed");

    let client = Arc::new(MemoryDeployClient::new());
    let orchestrator = BuildOrchestrator::new(
        h.store.clone(),
        h.layout.clone(),
        Arc::new(FixtureBuilder::new(b"v2".to_vec())),
        h.root(),
    )
    .with_deploy(Deployer::new(client.clone()), "https://cdn.example.net");

    let outcome = orchestrator
        .promote(
            Environment::Production,
            IncrementKind::Patch,
            &mut h.manifest,
            &h.manifest_path,
        )
        .await
        .expect("lockstep build failed");

    assert_eq!(outcome.deploys.len(), 2, "production then staging");
    assert_eq!(outcome.deploys[0].environment, Environment::Production);
    assert_eq!(outcome.deploys[1].environment, Environment::Staging);

    let uploads = client.uploaded_paths();
    assert!(uploads.contains(&"production/latest/app.js".to_string()));
    assert!(uploads.contains(&"staging/app.js".to_string()));
    assert!(client
        .purged_urls()
        .contains(&"https://cdn.example.net/production/latest/app.js".to_string()));
}
