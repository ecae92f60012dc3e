//! Stage executor - runs one stage invocation and its child subtree

use crate::{
    core::{guard::guard_passes, Outcome, Phase, ResultRecord, Stage},
    process::{CommandRunner, ProcessOutput},
    report::{notify, Reporter, RunEvent},
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Boxed executor future; boxing breaks the recursion between a stage and its children
pub type ExecutionFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// How an invocation was dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationLevel {
    /// Dispatched directly by the engine
    Outermost,
    /// Recursed into from a parent stage
    Child,
}

impl InvocationLevel {
    /// Phase of the report sent on the monitor channel
    pub fn report_phase(self) -> Phase {
        match self {
            InvocationLevel::Outermost => Phase::End,
            InvocationLevel::Child => Phase::Continue,
        }
    }
}

/// Dispatcher-side ends of one invocation
///
/// Dropping `input` after the single send closes the stage's input; `output`
/// yields the stage's record and then closes.
pub struct StageHandle {
    pub input: mpsc::Sender<ResultRecord>,
    pub output: mpsc::Receiver<ResultRecord>,
    pub task: JoinHandle<()>,
}

/// Executor-side ends of one invocation
struct Endpoints {
    input: mpsc::Receiver<ResultRecord>,
    output: mpsc::Sender<ResultRecord>,
}

/// Executes stage invocations as independent tasks
pub struct StageExecutor<R> {
    runner: Arc<R>,
    reporter: Arc<dyn Reporter>,
    monitor: mpsc::UnboundedSender<ResultRecord>,
}

impl<R> Clone for StageExecutor<R> {
    fn clone(&self) -> Self {
        Self {
            runner: self.runner.clone(),
            reporter: self.reporter.clone(),
            monitor: self.monitor.clone(),
        }
    }
}

impl<R: CommandRunner + 'static> StageExecutor<R> {
    pub fn new(
        runner: Arc<R>,
        reporter: Arc<dyn Reporter>,
        monitor: mpsc::UnboundedSender<ResultRecord>,
    ) -> Self {
        Self {
            runner,
            reporter,
            monitor,
        }
    }

    /// Allocate fresh endpoints and start an invocation of `stage`
    ///
    /// The task waits for exactly one record on `input`.
    pub fn spawn(&self, stage: Arc<Stage>, level: InvocationLevel) -> StageHandle {
        let (input_tx, input_rx) = mpsc::channel(1);
        let (output_tx, output_rx) = mpsc::channel(1);

        let endpoints = Endpoints {
            input: input_rx,
            output: output_tx,
        };
        let task = tokio::spawn(self.clone().execute(stage, endpoints, level));

        StageHandle {
            input: input_tx,
            output: output_rx,
            task,
        }
    }

    fn execute(self, stage: Arc<Stage>, endpoints: Endpoints, level: InvocationLevel) -> ExecutionFuture {
        Box::pin(async move {
            let Endpoints { mut input, output } = endpoints;

            let Some(mut record) = input.recv().await else {
                warn!("Stage {} received no input, not running", stage.name);
                return;
            };
            drop(input);

            let outcome = self.run_stage(&stage).await;
            record.record(&stage.name, outcome);

            for child in &stage.children {
                self.run_child(&stage, child, &mut record).await;
            }

            record.phase = level.report_phase();

            if output.send(record.clone()).await.is_err() {
                debug!("Output of stage {} was not read", stage.name);
            }
            drop(output);

            if self.monitor.send(record).is_err() {
                debug!("Monitor closed before stage {} reported", stage.name);
            }
        })
    }

    /// Guard, then run; a guard that does not pass counts as success
    async fn run_stage(&self, stage: &Stage) -> Outcome {
        let guard_ok = guard_passes(
            stage.guard.as_ref(),
            self.runner.as_ref(),
            stage.directory.clone(),
        )
        .await;

        if !guard_ok {
            info!("Skipping stage {}: run guard did not pass", stage.name);
            notify(
                self.reporter.as_ref(),
                RunEvent::StageSkipped {
                    stage: stage.name.clone(),
                },
            );
            self.finish(stage, Outcome::Passed, None);
            return Outcome::Passed;
        }

        info!("Executing stage: {}", stage.name);

        let (outcome, output) = match self.runner.run(&stage.invocation()).await {
            Ok(output) => {
                debug!("Stage {} stdout: {}", stage.name, output.stdout.trim_end());
                if !output.stderr.is_empty() {
                    debug!("Stage {} stderr: {}", stage.name, output.stderr.trim_end());
                }
                (Outcome::from_success(output.success()), Some(output))
            }
            Err(e) => {
                warn!("Stage {} could not run: {}", stage.name, e);
                (Outcome::Failed, None)
            }
        };

        self.finish(stage, outcome, output);
        outcome
    }

    fn finish(&self, stage: &Stage, outcome: Outcome, output: Option<ProcessOutput>) {
        if outcome.is_failure() {
            warn!("Stage {} failed", stage.name);
        } else {
            info!("Stage {} succeeded", stage.name);
        }

        notify(
            self.reporter.as_ref(),
            RunEvent::StageFinished {
                stage: stage.name.clone(),
                outcome,
                output,
                finished_at: chrono::Utc::now(),
            },
        );
    }

    /// Run one child to completion and fold its outcomes into `record`
    async fn run_child(&self, parent: &Stage, child: &Arc<Stage>, record: &mut ResultRecord) {
        debug!("Executing child stage {} of {}", child.name, parent.name);

        let StageHandle {
            input,
            mut output,
            task,
        } = self.spawn(child.clone(), InvocationLevel::Child);

        if input.send(record.with_phase(Phase::Start)).await.is_err() {
            warn!("Child stage {} stopped before receiving input", child.name);
        }
        drop(input);

        while let Some(reported) = output.recv().await {
            record.merge_except(&reported, &parent.name);
        }

        // Joining also guarantees the child's monitor report is queued first.
        if let Err(e) = task.await {
            error!("Child stage {} aborted: {}", child.name, e);
            if child.name != parent.name {
                record.record(&child.name, Outcome::Failed);
            }
        }
    }
}
