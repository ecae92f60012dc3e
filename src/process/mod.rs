//! External process execution for stages and run guards

pub mod output;
pub mod shell;

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

pub use output::{ProcessError, ProcessOutput};
pub use shell::{ShellRunner, ShellRunnerConfig};

/// What to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    /// A command line handed to the shell
    Shell(String),
    /// A script file run by the shell
    Script(PathBuf),
}

/// A single request to run an external process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: Program,

    /// Working directory (inherits the current one when None)
    pub directory: Option<PathBuf>,

    /// Deadline for the process (waits indefinitely when None)
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            program: Program::Shell(command.into()),
            directory: None,
            timeout: None,
        }
    }

    pub fn script(file: impl Into<PathBuf>) -> Self {
        Self {
            program: Program::Script(file.into()),
            directory: None,
            timeout: None,
        }
    }

    pub fn in_directory(mut self, directory: Option<PathBuf>) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Short human-readable description used in logs
    pub fn describe(&self) -> String {
        match &self.program {
            Program::Shell(command) => command.clone(),
            Program::Script(file) => file.display().to_string(),
        }
    }
}

/// Trait for running external processes - allows for different implementations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the invocation to completion and report how it exited
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ProcessError>;
}
