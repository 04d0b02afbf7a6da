//! Source-control info captured into version records.

use std::path::Path;
use std::process::Command;

/// Commit and branch at archive time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    /// Short commit id, or "local" outside a repository.
    pub commit: String,
    /// Branch name, or "unknown" outside a repository.
    pub branch: String,
}

impl SourceInfo {
    /// Sentinels for a project not under version control.
    pub fn local() -> Self {
        SourceInfo {
            commit: "local".to_string(),
            branch: "unknown".to_string(),
        }
    }
}

/// Capture the short commit id and branch name for `dir`.
///
/// Never fails: outside a repository, or with git missing entirely, the
/// sentinel values from [`SourceInfo::local`] fill in.
pub fn capture_source_info(dir: &Path) -> SourceInfo {
    let commit = git_stdout(dir, &["rev-parse", "--short", "HEAD"])
        .unwrap_or_else(|| "local".to_string());
    let branch = git_stdout(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
        .unwrap_or_else(|| "unknown".to_string());
    SourceInfo { commit, branch }
}

fn git_stdout(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
