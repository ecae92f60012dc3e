//! Process result types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for process execution
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timeout after {0} seconds")]
    Timeout(u64),
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutput {
    /// Exit code (None when terminated by a signal)
    pub code: Option<i32>,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,
}

impl ProcessOutput {
    /// Create an output from an exit code with no captured text
    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    /// Zero exit status
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}
