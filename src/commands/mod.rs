//! Command handlers behind the `relearn` subcommands.
//!
//! Each handler returns `Ok(true)` / `Ok(false)` for the binary success/failure
//! exit status, and `Err` only for fatal startup problems.

mod common;
pub mod report;
pub mod run;

pub use common::ConfigOverrides;
