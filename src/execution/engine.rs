//! Main execution engine - orchestrates the entire pipeline run

use crate::{
    core::{Outcome, Phase, Pipeline, ResultRecord, Stage},
    execution::{InvocationLevel, RunPolicy, StageExecutor, StageHandle},
    process::CommandRunner,
    report::{notify, RunEvent},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Outcomes of a full run: main stages plus cleanup stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcomes: ResultRecord,
    pub cleanup: Option<ResultRecord>,
}

impl RunReport {
    /// A run succeeds when none of its main stages failed
    pub fn is_success(&self) -> bool {
        !self.outcomes.is_any_failure()
    }
}

/// Drives pipeline runs
///
/// Holds no per-run state: every run allocates its own monitor channel and
/// fresh endpoints for each stage invocation.
pub struct ExecutionEngine<R> {
    pipeline: Pipeline,
    policy: RunPolicy,
    runner: Arc<R>,
}

impl<R: CommandRunner + 'static> ExecutionEngine<R> {
    pub fn new(pipeline: Pipeline, runner: R, policy: RunPolicy) -> Self {
        Self::with_shared_runner(pipeline, Arc::new(runner), policy)
    }

    pub fn with_shared_runner(pipeline: Pipeline, runner: Arc<R>, policy: RunPolicy) -> Self {
        Self {
            pipeline,
            policy,
            runner,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn policy(&self) -> RunPolicy {
        self.policy
    }

    /// Run the main stages, then the cleanup stages
    pub async fn run(&self) -> RunReport {
        let outcomes = self.run_once().await;
        let cleanup = if self.pipeline.cleanup.is_empty() {
            None
        } else {
            Some(self.run_cleanup().await)
        };
        RunReport { outcomes, cleanup }
    }

    /// Run every root stage in order, applying the halt policy between them
    pub async fn run_once(&self) -> ResultRecord {
        self.run_stages(&self.pipeline.name, &self.pipeline.stages).await
    }

    /// Run the cleanup stages with the same protocol and policy
    pub async fn run_cleanup(&self) -> ResultRecord {
        let label = format!("{} (cleanup)", self.pipeline.name);
        self.run_stages(&label, &self.pipeline.cleanup).await
    }

    /// Run a single stage and its children as an outermost invocation
    pub async fn execute_stage(&self, stage: &Arc<Stage>) -> ResultRecord {
        let (monitor_tx, mut monitor_rx) = mpsc::unbounded_channel();
        let executor = self.executor(monitor_tx);

        let mut accumulated = ResultRecord::new(Phase::Start);
        self.dispatch(&executor, &mut monitor_rx, stage, &mut accumulated)
            .await;
        accumulated.phase = Phase::End;
        accumulated
    }

    async fn run_stages(&self, label: &str, stages: &[Arc<Stage>]) -> ResultRecord {
        let run_id = Uuid::new_v4();
        let reporter = self.pipeline.reporter.as_ref();

        info!("Starting pipeline run: {} ({})", label, run_id);
        notify(
            reporter,
            RunEvent::RunStarted {
                run_id,
                pipeline: label.to_string(),
                stages: stages.len(),
            },
        );

        let (monitor_tx, mut monitor_rx) = mpsc::unbounded_channel();
        let executor = self.executor(monitor_tx);
        let mut accumulated = ResultRecord::new(Phase::Start);

        for (index, stage) in stages.iter().enumerate() {
            self.dispatch(&executor, &mut monitor_rx, stage, &mut accumulated)
                .await;

            if self.policy.should_halt(&accumulated) {
                let remaining = &stages[index + 1..];
                if !remaining.is_empty() {
                    warn!(
                        "Stage {} left failures behind, halting {} remaining stage(s)",
                        stage.name,
                        remaining.len()
                    );
                }
                self.halt(remaining, &mut accumulated);
                break;
            }
        }

        accumulated.phase = Phase::End;
        let success = !accumulated.is_any_failure();

        info!(
            "Pipeline run finished: {} - {}",
            label,
            if success { "success" } else { "failure" }
        );
        notify(
            reporter,
            RunEvent::RunFinished {
                run_id,
                pipeline: label.to_string(),
                success,
            },
        );

        accumulated
    }

    fn executor(&self, monitor: mpsc::UnboundedSender<ResultRecord>) -> StageExecutor<R> {
        StageExecutor::new(self.runner.clone(), self.pipeline.reporter.clone(), monitor)
    }

    /// Dispatch one outermost invocation and merge its reports into `accumulated`
    async fn dispatch(
        &self,
        executor: &StageExecutor<R>,
        monitor: &mut mpsc::UnboundedReceiver<ResultRecord>,
        stage: &Arc<Stage>,
        accumulated: &mut ResultRecord,
    ) {
        let StageHandle {
            input,
            mut output,
            task,
        } = executor.spawn(stage.clone(), InvocationLevel::Outermost);

        if input.send(accumulated.with_phase(Phase::Start)).await.is_err() {
            warn!("Stage {} stopped before receiving input", stage.name);
        }
        drop(input);

        // The monitor channel is authoritative; output is drained so the
        // executor never waits on it.
        while output.recv().await.is_some() {}

        let completed = match task.await {
            Ok(()) => true,
            Err(e) => {
                error!("Stage {} aborted: {}", stage.name, e);
                false
            }
        };

        // The task and its whole subtree have finished, so every report is queued.
        let mut saw_end = false;
        while let Ok(report) = monitor.try_recv() {
            debug!("Monitor report for {}: {:?}", stage.name, report.phase);
            accumulated.merge(&report);
            if report.phase == Phase::End {
                saw_end = true;
                break;
            }
        }

        if !saw_end {
            if completed {
                warn!("Stage {} finished without a final report", stage.name);
            }
            accumulated.record(&stage.name, Outcome::Failed);
        }
    }

    /// Mark every undispatched stage and its children failed without running them
    fn halt(&self, remaining: &[Arc<Stage>], accumulated: &mut ResultRecord) {
        for stage in remaining {
            for name in stage.subtree_names() {
                info!("Halting stage {}", name);
                accumulated.record(&name, Outcome::Failed);
                notify(
                    self.pipeline.reporter.as_ref(),
                    RunEvent::StageHalted { stage: name },
                );
            }
        }
    }
}
