//! Shell subprocess runner

use crate::process::{CommandRunner, Invocation, ProcessError, ProcessOutput, Program};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Configuration for the shell runner
#[derive(Debug, Clone)]
pub struct ShellRunnerConfig {
    /// Shell executable used for commands, scripts and guards
    pub shell: String,

    /// Timeout applied when an invocation carries none
    pub default_timeout_secs: Option<u64>,
}

impl Default for ShellRunnerConfig {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            default_timeout_secs: None,
        }
    }
}

impl ShellRunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_default_timeout(mut self, timeout_secs: u64) -> Self {
        self.default_timeout_secs = Some(timeout_secs);
        self
    }
}

/// Runs invocations through `sh`
///
/// Commands and guards run as `sh -c <command>`, script files as `sh <file>`.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    config: ShellRunnerConfig,
}

impl ShellRunner {
    pub fn new(config: ShellRunnerConfig) -> Self {
        Self { config }
    }

    pub fn shell(&self) -> &str {
        &self.config.shell
    }

    fn build_command(&self, invocation: &Invocation) -> Command {
        let mut command = Command::new(&self.config.shell);
        match &invocation.program {
            Program::Shell(line) => {
                command.arg("-c").arg(line);
            }
            Program::Script(file) => {
                command.arg(file);
            }
        }
        if let Some(directory) = &invocation.directory {
            command.current_dir(directory);
        }
        command.kill_on_drop(true);
        command
    }

    fn effective_timeout(&self, invocation: &Invocation) -> Option<Duration> {
        invocation
            .timeout
            .or_else(|| self.config.default_timeout_secs.map(Duration::from_secs))
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(ShellRunnerConfig::default())
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    /// Run the invocation and capture its output
    ///
    /// # Errors
    /// Returns `ProcessError` if:
    /// - The shell cannot be spawned (missing binary, bad working directory)
    /// - The process outlives its timeout
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ProcessError> {
        debug!("Spawning {} for: {}", self.config.shell, invocation.describe());

        let output = self.build_command(invocation).output();

        let result = match self.effective_timeout(invocation) {
            Some(limit) => timeout(limit, output)
                .await
                .map_err(|_| ProcessError::Timeout(limit.as_secs()))?,
            None => output.await,
        };

        let output = result.map_err(|source| ProcessError::Spawn {
            program: self.config.shell.clone(),
            source,
        })?;

        let output = ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.success() {
            warn!(
                "{} exited with code {:?}: {}",
                invocation.describe(),
                output.code,
                output.stderr.trim()
            );
        }

        Ok(output)
    }
}
