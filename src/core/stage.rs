//! Stage domain model

use crate::core::guard::RunGuard;
use crate::process::Invocation;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// What a stage executes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageKind {
    /// A command line run through the shell
    Command { command: String },
    /// A script file run by the shell
    Script { file: PathBuf },
}

/// A single step in a pipeline, possibly owning child stages
///
/// Stages carry no channels: every run allocates fresh endpoints per
/// invocation, so a stage can be reused across runs.
#[derive(Debug, Clone)]
pub struct Stage {
    /// Display name and key in the outcome map
    pub name: String,

    /// What to execute
    pub kind: StageKind,

    /// Optional precondition (`only_if`)
    pub guard: Option<RunGuard>,

    /// Child stages, run in order after this stage
    pub children: Vec<Arc<Stage>>,

    /// Working directory for the process and its guard
    pub directory: Option<PathBuf>,

    /// Timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl Stage {
    pub fn new(name: impl Into<String>, kind: StageKind) -> Self {
        Self {
            name: name.into(),
            kind,
            guard: None,
            children: Vec::new(),
            directory: None,
            timeout_secs: None,
        }
    }

    /// Command stage
    pub fn command(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(
            name,
            StageKind::Command {
                command: command.into(),
            },
        )
    }

    /// Command stage named after its own command line
    pub fn from_command(command: impl Into<String>) -> Self {
        let command = command.into();
        Self::command(command.clone(), command)
    }

    /// Script file stage
    pub fn script(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self::new(name, StageKind::Script { file: file.into() })
    }

    pub fn with_guard(mut self, expression: impl Into<String>) -> Self {
        self.guard = Some(RunGuard::new(expression));
        self
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn with_child(mut self, child: Stage) -> Self {
        self.add_child(child);
        self
    }

    pub fn add_child(&mut self, child: Stage) {
        self.children.push(Arc::new(child));
    }

    /// The process request for this stage's runnable
    pub fn invocation(&self) -> Invocation {
        let invocation = match &self.kind {
            StageKind::Command { command } => Invocation::shell(command),
            StageKind::Script { file } => Invocation::script(file),
        };
        invocation
            .in_directory(self.directory.clone())
            .with_timeout(self.timeout_secs.map(Duration::from_secs))
    }

    /// Names of this stage and all its descendants, depth first
    pub fn subtree_names(&self) -> Vec<String> {
        let mut names = vec![self.name.clone()];
        for child in &self.children {
            names.extend(child.subtree_names());
        }
        names
    }
}
