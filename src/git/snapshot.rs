//! Snapshot store: git commits used as revertible checkpoints.
//!
//! Each attempt's changes are committed so they can be diffed against the
//! parent and, if the attempt failed, reset away. Successful attempts leave
//! their commit in history.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::runner::{run_git, run_git_bool, run_git_checked};
use crate::error::SetupError;

/// Result of a snapshot commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    /// False when the working tree had no changes to record.
    pub committed: bool,
}

/// Commit / diff / rollback primitives the learning loop drives.
pub trait SnapshotStore {
    /// Stage every working-tree change and commit it under `label`.
    fn commit(&self, label: &str) -> Result<CommitOutcome>;

    /// Diff between HEAD and its parent. Empty when there is no parent.
    fn diff_since_previous(&self) -> String;

    /// Discard the most recent commit and all working-tree changes since it.
    fn rollback_last_commit(&self) -> Result<()>;
}

/// `SnapshotStore` backed by the `git` binary.
#[derive(Debug, Clone)]
pub struct GitSnapshots {
    repo_root: PathBuf,
}

impl GitSnapshots {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    /// Reset the index and work tree to HEAD and remove untracked files.
    fn discard_changes(&self) {
        for args in [&["reset", "--hard", "HEAD"][..], &["clean", "-fd"][..]] {
            if let Err(e) = run_git_checked(args, &self.repo_root) {
                tracing::warn!(error = %e, "could not discard uncommitted changes");
            }
        }
    }
}

impl SnapshotStore for GitSnapshots {
    fn commit(&self, label: &str) -> Result<CommitOutcome> {
        run_git_checked(&["add", "-A"], &self.repo_root).context("Failed to stage changes")?;

        let status = run_git_checked(&["status", "--porcelain"], &self.repo_root)
            .context("Failed to read working tree status")?;
        if status.trim().is_empty() {
            tracing::debug!(label, "nothing to commit");
            return Ok(CommitOutcome { committed: false });
        }

        if let Err(e) = run_git_checked(&["commit", "--no-verify", "-m", label], &self.repo_root) {
            // no commit to roll back later, so restore HEAD here
            self.discard_changes();
            return Err(e).with_context(|| format!("Failed to create snapshot commit '{label}'"));
        }

        tracing::debug!(label, "snapshot committed");
        Ok(CommitOutcome { committed: true })
    }

    fn diff_since_previous(&self) -> String {
        if !run_git_bool(&["rev-parse", "--verify", "--quiet", "HEAD~1"], &self.repo_root) {
            return String::new();
        }

        match run_git_checked(&["diff", "HEAD~1", "HEAD"], &self.repo_root) {
            Ok(diff) => diff,
            Err(e) => {
                tracing::warn!(error = %e, "could not compute snapshot diff");
                String::new()
            }
        }
    }

    fn rollback_last_commit(&self) -> Result<()> {
        run_git_checked(&["reset", "--hard", "HEAD~1"], &self.repo_root)
            .context("Failed to roll back snapshot commit")?;
        tracing::debug!("snapshot rolled back");
        Ok(())
    }
}

/// Check that the git binary is on PATH and runs.
pub fn check_git_available() -> Result<(), SetupError> {
    if which::which("git").is_err() {
        return Err(SetupError::GitUnavailable);
    }
    match std::process::Command::new("git").arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        _ => Err(SetupError::GitUnavailable),
    }
}

/// Resolve `project_dir` and verify it is inside a git work tree.
///
/// Returns the canonical project path.
pub fn ensure_repository(project_dir: &Path) -> Result<PathBuf, SetupError> {
    if !project_dir.is_dir() {
        return Err(SetupError::MissingProjectDir(project_dir.to_path_buf()));
    }

    let root = project_dir
        .canonicalize()
        .map_err(|_| SetupError::MissingProjectDir(project_dir.to_path_buf()))?;

    check_git_available()?;

    let inside = run_git(&["rev-parse", "--is-inside-work-tree"], &root)
        .map(|o| o.status.success() && String::from_utf8_lossy(&o.stdout).trim() == "true")
        .unwrap_or(false);
    if !inside {
        return Err(SetupError::NotARepository(root));
    }

    // attempt commits need a parent to diff against and reset to
    if !run_git_bool(&["rev-parse", "--verify", "--quiet", "HEAD"], &root) {
        return Err(SetupError::NoInitialCommit(root));
    }

    Ok(root)
}
