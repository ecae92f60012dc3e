//! Result records passed between the engine and stage executors

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of a single stage
///
/// Serialized as the strings `"true"` and `"false"` so reports keep the
/// familiar shape of a stage-name → status map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Stage ran and exited zero, or its run guard did not pass
    #[serde(rename = "true")]
    Passed,
    /// Stage exited non-zero, could not be started, or was halted
    #[serde(rename = "false")]
    Failed,
}

impl Outcome {
    pub fn from_success(success: bool) -> Self {
        if success {
            Outcome::Passed
        } else {
            Outcome::Failed
        }
    }

    pub fn is_failure(self) -> bool {
        self == Outcome::Failed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Passed => "true",
            Outcome::Failed => "false",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a record sits in the execution protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Kicks off an execution
    Start,
    /// Intermediate completion, usually from a child stage
    Continue,
    /// Terminal completion of an outermost invocation
    End,
}

/// Cumulative per-stage outcomes plus a phase tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub outcomes: BTreeMap<String, Outcome>,
    pub phase: Phase,
}

impl ResultRecord {
    /// Create an empty record in the given phase
    pub fn new(phase: Phase) -> Self {
        Self {
            outcomes: BTreeMap::new(),
            phase,
        }
    }

    /// Copy of this record re-tagged with another phase
    pub fn with_phase(&self, phase: Phase) -> Self {
        Self {
            outcomes: self.outcomes.clone(),
            phase,
        }
    }

    /// Record the outcome owned by `stage`
    pub fn record(&mut self, stage: &str, outcome: Outcome) {
        self.outcomes.insert(stage.to_string(), outcome);
    }

    /// Merge every outcome of `other` into this record
    pub fn merge(&mut self, other: &ResultRecord) {
        for (name, outcome) in &other.outcomes {
            self.outcomes.insert(name.clone(), *outcome);
        }
    }

    /// Merge `other` without touching the entry owned by `owner`
    pub fn merge_except(&mut self, other: &ResultRecord, owner: &str) {
        for (name, outcome) in &other.outcomes {
            if name != owner {
                self.outcomes.insert(name.clone(), *outcome);
            }
        }
    }

    pub fn get(&self, stage: &str) -> Option<Outcome> {
        self.outcomes.get(stage).copied()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// True iff any recorded outcome is a failure
    pub fn is_any_failure(&self) -> bool {
        self.outcomes.values().any(|outcome| outcome.is_failure())
    }

    /// Names of the failed stages, in name order
    pub fn failures(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl Default for ResultRecord {
    fn default() -> Self {
        Self::new(Phase::Start)
    }
}
