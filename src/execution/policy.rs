//! Run policy - decides whether a failure stops the remaining root stages

use crate::core::ResultRecord;
use serde::{Deserialize, Serialize};

/// Options for a pipeline run
///
/// The flag's effect is the reverse of what its name suggests: while it is
/// `false` the first failure halts the run and every undispatched root stage
/// is marked failed; while it is `true` failures are ignored and every root
/// stage still runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPolicy {
    #[serde(default)]
    pub halt_early_when_no_failure_stop: bool,
}

impl RunPolicy {
    pub fn new(halt_early_when_no_failure_stop: bool) -> Self {
        Self {
            halt_early_when_no_failure_stop,
        }
    }

    /// Whether the run must stop after the accumulated outcomes so far
    pub fn should_halt(&self, accumulated: &ResultRecord) -> bool {
        accumulated.is_any_failure() && !self.halt_early_when_no_failure_stop
    }
}
