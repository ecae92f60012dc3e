//! stagehand - a deployment pipeline runner for command and script stages

pub mod cli;
pub mod core;
pub mod execution;
pub mod process;
pub mod report;

// Re-export commonly used types
pub use core::{Outcome, Phase, Pipeline, ResultRecord, RunGuard, Stage, StageKind};
pub use execution::{ExecutionEngine, RunPolicy, RunReport};
pub use process::{CommandRunner, Invocation, ProcessError, ProcessOutput, ShellRunner};
pub use report::{Reporter, RunEvent};
