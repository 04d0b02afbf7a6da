//! Promotion decisions.
//!
//! `decide` is a pure function of the registry pointers and the caller's
//! intent. Every side effect (bump, build, copy, archive, deploy) lives in
//! the orchestrator stages, so the decision table is testable on its own.

use semver::Version;
use serde::Serialize;
use slipway_store::Environment;

use crate::domain::version::{increment, IncrementKind};

/// Where the next latest artifacts come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactSource {
    /// Run the builder.
    Rebuild,
    /// Byte-copy staging's already-built output.
    Adopt,
}

/// Outcome of a promotion decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildDecision {
    /// Version the environment moves to.
    pub next_version: Version,
    pub source: ArtifactSource,
    /// Set only on the lockstep production path that also writes staging.
    pub mirror_to_staging: bool,
}

/// Decide the next version and artifact source for a build request.
///
/// Staging always rebuilds at `increment(current, kind)`; it has no adoption
/// path. A production request takes exactly one of three paths, evaluated in
/// this precedence order:
///
/// 1. *Adopt*: staging has built output on disk and its version is strictly
///    ahead of production's (or production has none archived). Production
///    moves to staging's version by byte copy, no rebuild.
/// 2. *Bump in lockstep*: staging's and production's versions are both set
///    and equal. Rebuild at `increment(current, kind)` and mirror the output
///    and version into staging.
/// 3. *Bump solo*: everything else. Rebuild at `increment(base, kind)` where
///    `base` is production's own version when archived, else `current`.
///
/// The three arms partition the input space; a staging version that
/// regressed below production's falls through to the solo bump.
pub fn decide(
    environment: Environment,
    kind: IncrementKind,
    current: &Version,
    staging_latest: Option<&Version>,
    production_latest: Option<&Version>,
    staging_artifacts_present: bool,
) -> BuildDecision {
    if environment == Environment::Staging {
        return BuildDecision {
            next_version: increment(current, kind),
            source: ArtifactSource::Rebuild,
            mirror_to_staging: false,
        };
    }

    if staging_artifacts_present {
        if let Some(staging) = staging_latest {
            let ahead = match production_latest {
                Some(production) => staging > production,
                None => true,
            };
            if ahead {
                return BuildDecision {
                    next_version: staging.clone(),
                    source: ArtifactSource::Adopt,
                    mirror_to_staging: false,
                };
            }
        }
    }

    if let (Some(staging), Some(production)) = (staging_latest, production_latest) {
        if staging == production {
            return BuildDecision {
                next_version: increment(current, kind),
                source: ArtifactSource::Rebuild,
                mirror_to_staging: true,
            };
        }
    }

    let base = production_latest.unwrap_or(current);
    BuildDecision {
        next_version: increment(base, kind),
        source: ArtifactSource::Rebuild,
        mirror_to_staging: false,
    }
}
