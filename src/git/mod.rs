//! Git primitives for attempt snapshots
//!
//! This module provides:
//! - A thin runner around the `git` binary
//! - Repository precondition checks run before the loop starts
//! - The snapshot store: commit, diff against parent, roll back one commit

pub mod runner;
pub mod snapshot;

pub use snapshot::{check_git_available, ensure_repository, CommitOutcome, GitSnapshots, SnapshotStore};
