//! Semantic-version increments.

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::domain::error::SlipwayError;

/// Which component of the version to bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncrementKind {
    Patch,
    Minor,
    Major,
}

impl IncrementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncrementKind::Patch => "patch",
            IncrementKind::Minor => "minor",
            IncrementKind::Major => "major",
        }
    }
}

impl std::fmt::Display for IncrementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IncrementKind {
    type Err = SlipwayError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "patch" => Ok(IncrementKind::Patch),
            "minor" => Ok(IncrementKind::Minor),
            "major" => Ok(IncrementKind::Major),
            other => Err(SlipwayError::Validation(format!(
                "unknown increment kind '{other}' (expected patch, minor or major)"
            ))),
        }
    }
}

/// Version a freshly reset project starts from.
pub fn baseline() -> Version {
    Version::new(0, 0, 1)
}

/// Standard semantic-version increment. Bumping a component zeroes the lower
/// ones; pre-release and build metadata never survive an increment.
pub fn increment(version: &Version, kind: IncrementKind) -> Version {
    match kind {
        IncrementKind::Patch => Version::new(version.major, version.minor, version.patch + 1),
        IncrementKind::Minor => Version::new(version.major, version.minor + 1, 0),
        IncrementKind::Major => Version::new(version.major + 1, 0, 0),
    }
}
