//! Run guard model

use crate::process::{CommandRunner, Invocation};
use std::path::PathBuf;
use tracing::debug;

/// Precondition checked before a stage runs (`only_if`)
///
/// A guard that does not pass skips the stage, and the skipped stage still
/// counts as a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunGuard {
    /// Shell expression, e.g. `test -f Makefile`
    pub expression: String,
}

impl RunGuard {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    /// Build a guard from an optional expression, treating blank as absent
    pub fn from_expression(expression: Option<&str>) -> Option<Self> {
        expression
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(Self::new)
    }

    /// Run the guard expression; zero exit passes, anything else does not
    pub async fn passes<R: CommandRunner + ?Sized>(
        &self,
        runner: &R,
        directory: Option<PathBuf>,
    ) -> bool {
        let invocation = Invocation::shell(&self.expression).in_directory(directory);
        match runner.run(&invocation).await {
            Ok(output) => output.success(),
            Err(e) => {
                debug!("Guard '{}' could not run: {}", self.expression, e);
                false
            }
        }
    }
}

/// Evaluate an optional guard: absent guards always pass
pub async fn guard_passes<R: CommandRunner + ?Sized>(
    guard: Option<&RunGuard>,
    runner: &R,
    directory: Option<PathBuf>,
) -> bool {
    match guard {
        None => true,
        Some(guard) => guard.passes(runner, directory).await,
    }
}
