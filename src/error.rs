//! Fatal startup errors.
//!
//! Everything that can go wrong inside an attempt is absorbed by the loop.
//! These are the conditions checked before the first attempt that abort the run.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("project directory does not exist: {0}")]
    MissingProjectDir(PathBuf),

    #[error("project directory is not a git repository: {0} (initialize with: git init)")]
    NotARepository(PathBuf),

    #[error("git repository has no commits yet: {0} (create an initial commit first)")]
    NoInitialCommit(PathBuf),

    #[error("git is not installed or not in PATH")]
    GitUnavailable,

    #[error("no analysis backend available: {0}")]
    NoAnalysisBackend(String),
}
