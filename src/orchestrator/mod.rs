//! Control flow: the attempt/verify/learn loop and the manual failure report.

pub mod learning_loop;
pub mod report;

pub use learning_loop::{LearningLoop, LoopOutcome, LoopState};
pub use report::report_manual_failure;
