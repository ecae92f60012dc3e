//! Pipeline domain model

use crate::core::stage::Stage;
use crate::report::{NoopReporter, Reporter};
use std::fmt;
use std::sync::Arc;

/// An ordered collection of root stages plus the reporter that hears about them
#[derive(Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Root stages, in execution order
    pub stages: Vec<Arc<Stage>>,

    /// Stages run after the main stages, whatever their outcome
    pub cleanup: Vec<Arc<Stage>>,

    /// Lifecycle event sink
    pub reporter: Arc<dyn Reporter>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            cleanup: Vec::new(),
            reporter: Arc::new(NoopReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Append a root stage
    pub fn add_stage(&mut self, stage: Stage) {
        self.stages.push(Arc::new(stage));
    }

    /// Append a cleanup stage
    pub fn add_cleanup_stage(&mut self, stage: Stage) {
        self.cleanup.push(Arc::new(stage));
    }

    /// Find a root stage by name
    pub fn stage(&self, name: &str) -> Option<&Arc<Stage>> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Root stage names in execution order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stages)
            .field("cleanup", &self.cleanup)
            .finish_non_exhaustive()
    }
}
