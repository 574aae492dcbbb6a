pub mod analysis;
pub mod commands;
pub mod config;
pub mod error;
pub mod executor;
pub mod fs;
pub mod git;
pub mod logging;
pub mod orchestrator;
pub mod utils;
