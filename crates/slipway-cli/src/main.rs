//! Slipway - dual-environment deployment CLI
//!
//! The `slipway` command promotes versioned front-end bundles through a
//! staging/production pair backed by a Bunny CDN storage zone.
//!
//! ## Commands
//!
//! - `build`: bump, build (or adopt) and archive a new version
//! - `deploy`: push an environment's latest slot to the CDN
//! - `restore`: roll an environment back to an archived version
//! - `versions`: list the archived versions for an environment
//! - `snippet`: write the HTML loader for embedding the widget
//! - `reset`: wipe all deployment state and start over

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use semver::Version;
use tracing::{info, Level};

use slipway_cdn::BunnyClient;
use slipway_core::{
    remote_base, ArtifactSource, BuildOrchestrator, CommandBuilder, Deployer, IncrementKind,
    ProjectManifest, ResetManager, RestoreManager, MANIFEST_FILE,
};
use slipway_store::layout::SCRIPT_FILE;
use slipway_store::{DistLayout, Environment, JsonVersionStore, VersionStore};

#[derive(Parser)]
#[command(name = "slipway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Dual-environment deployment state machine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output (log lines and listings)
    #[arg(long, global = true)]
    json: bool,

    /// Project root holding slipway.json and the dist tree
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bump, build (or adopt) and archive a new version
    Build {
        /// Target environment (staging or production)
        environment: Environment,

        /// Version increment to apply (patch, minor or major)
        #[arg(default_value = "patch")]
        increment: IncrementKind,

        /// Skip the CDN deploy stage
        #[arg(long)]
        no_deploy: bool,
    },

    /// Push an environment's latest slot to the CDN
    Deploy {
        /// Target environment (staging or production)
        environment: Environment,
    },

    /// Roll an environment back to an archived version
    Restore {
        /// Target environment (staging or production)
        environment: Environment,

        /// Version to restore (e.g. 1.4.2)
        version: Version,
    },

    /// List the archived versions for an environment
    Versions {
        /// Target environment (staging or production)
        environment: Environment,
    },

    /// Write the HTML loader snippet for embedding the widget
    Snippet {
        /// Public base URL of the pull zone
        #[arg(env = "BUNNY_CDN_URL")]
        cdn_url: String,
    },

    /// Delete all deployment state and reseed the empty skeleton
    Reset {
        /// Confirm the destructive wipe
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    slipway_core::init_tracing(cli.json, level);

    let root = cli.root;
    let json = cli.json;
    match cli.command {
        Commands::Build {
            environment,
            increment,
            no_deploy,
        } => cmd_build(&root, environment, increment, no_deploy).await,
        Commands::Deploy { environment } => cmd_deploy(&root, environment).await,
        Commands::Restore {
            environment,
            version,
        } => cmd_restore(&root, environment, &version).await,
        Commands::Versions { environment } => cmd_versions(&root, environment, json).await,
        Commands::Snippet { cdn_url } => cmd_snippet(&root, &cdn_url),
        Commands::Reset { yes } => cmd_reset(&root, yes).await,
    }
}

fn dist_layout(root: &Path) -> DistLayout {
    DistLayout::new(root.join("dist"))
}

fn load_manifest(root: &Path) -> Result<(ProjectManifest, PathBuf)> {
    let path = root.join(MANIFEST_FILE);
    let manifest = ProjectManifest::load(&path)
        .with_context(|| format!("Failed to read project manifest {:?}", path))?;
    Ok((manifest, path))
}

/// Bump, build (or adopt) and archive a new version
async fn cmd_build(
    root: &Path,
    environment: Environment,
    increment: IncrementKind,
    no_deploy: bool,
) -> Result<()> {
    let (mut manifest, manifest_path) = load_manifest(root)?;
    let layout = dist_layout(root);
    let store = Arc::new(JsonVersionStore::new(layout.clone()));
    let builder = Arc::new(CommandBuilder::new(manifest.build_command.clone()));

    let mut orchestrator = BuildOrchestrator::new(store, layout, builder, root);
    if !no_deploy {
        let client = BunnyClient::from_env().context(
            "Bunny credentials are required to deploy (pass --no-deploy to build without deploying)",
        )?;
        let cdn_url = client.config().cdn_url.clone();
        orchestrator = orchestrator.with_deploy(Deployer::new(Arc::new(client)), cdn_url);
    }

    info!(environment = %environment, increment = %increment, "starting promotion");
    let outcome = orchestrator
        .promote(environment, increment, &mut manifest, &manifest_path)
        .await?;

    println!("Promoted {} to {}", outcome.environment, outcome.version);
    if outcome.decision.source == ArtifactSource::Adopt {
        println!("Adopted staging's build output; no rebuild.");
    }
    if outcome.decision.mirror_to_staging {
        println!("Staging mirrored at {}", outcome.version);
    }
    for summary in &outcome.deploys {
        println!(
            "Deployed {} ({} files uploaded, {} URLs purged)",
            summary.environment,
            summary.uploaded.len(),
            summary.purged.len()
        );
    }

    Ok(())
}

/// Push an environment's latest slot to the CDN
async fn cmd_deploy(root: &Path, environment: Environment) -> Result<()> {
    let client = BunnyClient::from_env().context("Bunny credentials are required to deploy")?;
    let cdn_url = client.config().cdn_url.clone();
    let deployer = Deployer::new(Arc::new(client));

    let summary = deployer
        .deploy_latest(&dist_layout(root), environment, &cdn_url)
        .await?;

    println!(
        "Deployed {} ({} files uploaded, {} URLs purged)",
        summary.environment,
        summary.uploaded.len(),
        summary.purged.len()
    );
    for path in &summary.uploaded {
        println!("  {path}");
    }

    Ok(())
}

/// Roll an environment back to an archived version
async fn cmd_restore(root: &Path, environment: Environment, version: &Version) -> Result<()> {
    let layout = dist_layout(root);
    let store = Arc::new(JsonVersionStore::new(layout.clone()));

    let outcome = RestoreManager::new(store, layout)
        .restore(environment, version)
        .await?;

    println!("Restored {} to {}", outcome.environment, outcome.version);
    if outcome.cascaded_to_staging {
        println!("Staging was rewritten to match.");
    }

    Ok(())
}

/// List the archived versions for an environment
async fn cmd_versions(root: &Path, environment: Environment, json: bool) -> Result<()> {
    let layout = dist_layout(root);
    let store = JsonVersionStore::new(layout);
    let state = store.load(environment).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    if state.versions.is_empty() {
        println!("No versions archived for {environment}.");
        return Ok(());
    }

    // Newest first.
    for (version, record) in state.versions.iter().rev() {
        let marker = if state.latest.as_ref() == Some(version) {
            "* "
        } else {
            "  "
        };
        println!(
            "{}{:<12} {}  {} ({})  js {} B, css {} B",
            marker,
            version.to_string(),
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.source_commit,
            record.source_branch,
            record.artifact_sizes.script,
            record.artifact_sizes.style,
        );
    }

    Ok(())
}

/// Render the HTML loader snippet, clean and minified variants.
///
/// The loader picks the environment at page load: an `?env=staging` query
/// override or a `webflow.io` hostname selects staging, anything else
/// production. Each environment loads from its own remote base.
fn render_snippet(cdn_url: &str) -> String {
    let cdn = cdn_url.trim_end_matches('/');
    let staging_url = format!("{cdn}/{}/{SCRIPT_FILE}", remote_base(Environment::Staging));
    let production_url = format!(
        "{cdn}/{}/{SCRIPT_FILE}",
        remote_base(Environment::Production)
    );

    let clean = format!(
        r#"<!-- Slipway loader (clean) -->
<script>
document.addEventListener("DOMContentLoaded", function () {{
  const params = new URLSearchParams(location.search);
  const staging =
    params.get("env") === "staging" || location.hostname.includes("webflow.io");
  const url = staging ? "{staging_url}" : "{production_url}";

  const s = document.createElement("script");
  s.src = url;
  s.type = "text/javascript";
  document.body.appendChild(s);
  console.log("Loaded: " + url);
}});
</script>"#
    );

    let minified = format!(
        r#"<!-- Slipway loader (minified) -->
<script>document.addEventListener("DOMContentLoaded",function(){{const p=new URLSearchParams(location.search),g=p.get("env")==="staging"||location.hostname.includes("webflow.io"),u=g?"{staging_url}":"{production_url}",s=document.createElement("script");s.src=u,s.type="text/javascript",document.body.appendChild(s),console.log("Loaded: "+u)}});</script>"#
    );

    format!("{clean}\n\n{minified}\n")
}

/// Write the HTML loader snippet for embedding the widget
fn cmd_snippet(root: &Path, cdn_url: &str) -> Result<()> {
    let snippet = render_snippet(cdn_url);
    let layout = dist_layout(root);

    std::fs::create_dir_all(layout.root())
        .with_context(|| format!("Failed to create {:?}", layout.root()))?;
    let path = layout.root().join("snippet.html");
    std::fs::write(&path, &snippet).with_context(|| format!("Failed to write {:?}", path))?;

    println!("Wrote {}", path.display());

    Ok(())
}

/// Delete all deployment state and reseed the empty skeleton
async fn cmd_reset(root: &Path, yes: bool) -> Result<()> {
    let (mut manifest, manifest_path) = load_manifest(root)?;
    let layout = dist_layout(root);
    let store = Arc::new(JsonVersionStore::new(layout.clone()));

    ResetManager::new(store, layout)
        .reset(yes, &mut manifest, &manifest_path)
        .await?;

    println!("Reset complete; both registries are empty and the manifest is back to 0.0.1.");

    Ok(())
}
