//! Pipeline configuration from YAML

use crate::core::{guard::RunGuard, Pipeline, Stage, StageKind};
use crate::execution::RunPolicy;
use anyhow::{bail, Context, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::warn;

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    #[serde(default = "default_pipeline_name")]
    pub name: String,

    /// Run policy flag; `false` halts on the first failure
    #[serde(default)]
    pub halt_early_when_no_failure_stop: bool,

    /// Root stages, in execution order
    #[serde(default)]
    pub pipeline: Vec<StageConfig>,

    /// Stages run after the pipeline whatever its outcome
    #[serde(default)]
    pub cleanup: Vec<StageConfig>,
}

fn default_pipeline_name() -> String {
    "pipeline".to_string()
}

/// How a stage runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageType {
    /// `command` is run through the shell
    #[default]
    Command,
    /// `file` is a script run by the shell
    Shell,
}

/// Stage configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Stage name, also the key in the outcome map
    pub name: String,

    #[serde(default, rename = "type")]
    pub stage_type: StageType,

    /// Command line for command stages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Script path for shell stages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,

    /// Run guard expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_if: Option<String>,

    /// Timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Child stages, run in order after this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_after: Vec<StageConfig>,
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        for stage in self.pipeline.iter().chain(&self.cleanup) {
            stage.validate()?;
        }

        // Names double as outcome keys; duplicates are allowed but collapse in reports.
        for (section, stages) in [("pipeline", &self.pipeline), ("cleanup", &self.cleanup)] {
            let mut seen = HashSet::new();
            let mut names = Vec::new();
            for stage in stages {
                stage.collect_names(&mut names);
            }
            for name in names {
                if !seen.insert(name) {
                    warn!("Duplicate stage name in {}: {}", section, name);
                }
            }
        }

        Ok(())
    }

    /// The run policy described by this configuration
    pub fn policy(&self) -> RunPolicy {
        RunPolicy::new(self.halt_early_when_no_failure_stop)
    }

    /// Total number of stages, children included
    pub fn stage_count(&self) -> usize {
        fn count(stages: &[StageConfig]) -> usize {
            stages.iter().map(|s| 1 + count(&s.run_after)).sum()
        }
        count(&self.pipeline) + count(&self.cleanup)
    }

    /// Convert config to a Pipeline, expanding environment variables
    pub fn to_pipeline(&self) -> Result<Pipeline> {
        self.to_pipeline_with_env(|key| std::env::var(key).ok())
    }

    /// Convert config to a Pipeline using `lookup` for variable expansion
    pub fn to_pipeline_with_env<F>(&self, lookup: F) -> Result<Pipeline>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut pipeline = Pipeline::new(self.name.clone());
        for stage in &self.pipeline {
            pipeline.add_stage(stage.to_stage(&lookup)?);
        }
        for stage in &self.cleanup {
            pipeline.add_cleanup_stage(stage.to_stage(&lookup)?);
        }
        Ok(pipeline)
    }
}

impl StageConfig {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Stage name cannot be empty");
        }

        match self.stage_type {
            StageType::Command => {
                if self.command.as_deref().map_or(true, |c| c.trim().is_empty()) {
                    bail!("Stage '{}' has type 'command' but no command", self.name);
                }
            }
            StageType::Shell => {
                if self.file.as_deref().map_or(true, |f| f.trim().is_empty()) {
                    bail!("Stage '{}' has type 'shell' but no file", self.name);
                }
            }
        }

        if self.timeout_secs == Some(0) {
            bail!("Stage '{}' has a zero timeout", self.name);
        }

        for child in &self.run_after {
            child
                .validate()
                .with_context(|| format!("In run_after of stage '{}'", self.name))?;
        }

        Ok(())
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        names.push(&self.name);
        for child in &self.run_after {
            child.collect_names(names);
        }
    }

    fn to_stage<F>(&self, lookup: &F) -> Result<Stage>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = match self.stage_type {
            StageType::Command => match &self.command {
                Some(command) => StageKind::Command {
                    command: expand_env(command, lookup),
                },
                None => bail!("Stage '{}' has type 'command' but no command", self.name),
            },
            StageType::Shell => match &self.file {
                Some(file) => StageKind::Script {
                    file: PathBuf::from(expand_env(file, lookup)),
                },
                None => bail!("Stage '{}' has type 'shell' but no file", self.name),
            },
        };

        let mut stage = Stage::new(self.name.clone(), kind);
        stage.guard = RunGuard::from_expression(
            self.only_if.as_deref().map(|e| expand_env(e, lookup)).as_deref(),
        );
        stage.directory = self
            .directory
            .as_deref()
            .map(|d| PathBuf::from(expand_env(d, lookup)));
        stage.timeout_secs = self.timeout_secs;

        for child in &self.run_after {
            stage.add_child(child.to_stage(lookup)?);
        }

        Ok(stage)
    }
}

fn env_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Z_][A-Z0-9_]*)")
            .expect("environment variable pattern is valid")
    })
}

/// Replace `${VAR}` and `$VAR` with values from `lookup`; unknown names stay as written
pub fn expand_env<F>(input: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env_pattern()
        .replace_all(input, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            lookup(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
