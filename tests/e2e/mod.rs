//! End-to-end tests for relearn
//!
//! These drive the learning loop against real temporary git repositories, with
//! shell scripts standing in for the coding agent and the test runner, and a
//! scripted reasoning client behind the real direct backend.

pub mod cli;
pub mod learning_loop;
pub mod manual_report;

pub use helpers::*;
