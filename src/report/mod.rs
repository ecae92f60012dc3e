//! Lifecycle reporting for pipeline runs

use crate::core::Outcome;
use crate::process::ProcessOutput;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Events that can occur during a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    RunStarted {
        run_id: Uuid,
        pipeline: String,
        stages: usize,
    },
    /// Guard did not pass; the stage did not run
    StageSkipped {
        stage: String,
    },
    StageFinished {
        stage: String,
        outcome: Outcome,
        output: Option<ProcessOutput>,
        finished_at: DateTime<Utc>,
    },
    /// Marked failed without running after an earlier failure
    StageHalted {
        stage: String,
    },
    RunFinished {
        run_id: Uuid,
        pipeline: String,
        success: bool,
    },
}

/// Error raised by a reporter sink
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Reporter unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fire-and-forget sink for run lifecycle events
///
/// Errors are logged by the caller and never abort a run.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &RunEvent) -> Result<(), ReportError>;
}

/// Deliver an event, logging instead of propagating reporter failures
pub fn notify(reporter: &dyn Reporter, event: RunEvent) {
    if let Err(e) = reporter.report(&event) {
        warn!("Reporter failed on {:?}: {}", event, e);
    }
}

/// Reporter that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _event: &RunEvent) -> Result<(), ReportError> {
        Ok(())
    }
}

/// Reporter that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<RunEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Names of stages that finished, in report order
    pub fn finished_stages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RunEvent::StageFinished { stage, .. } => Some(stage),
                _ => None,
            })
            .collect()
    }

    /// Names of stages that were halted, in report order
    pub fn halted_stages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RunEvent::StageHalted { stage } => Some(stage),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &RunEvent) -> Result<(), ReportError> {
        self.events
            .lock()
            .map_err(|_| ReportError::Unavailable("event log poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}
