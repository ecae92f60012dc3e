//! Test: Run Guard - `only_if` skips a stage without failing it

use crate::helpers::*;
use stagehand::core::{Outcome, Pipeline, Stage};
use stagehand::execution::RunPolicy;
use std::sync::Arc;

fn guarded_pipeline(guard: &str) -> Pipeline {
    let mut pipeline = Pipeline::new("guarded");
    pipeline.add_stage(Stage::command("first", "echo first").with_guard(guard));
    pipeline.add_stage(Stage::command("second", "echo second"));
    pipeline.add_stage(Stage::command("third", "echo third"));
    pipeline
}

#[tokio::test]
async fn test_failing_guard_counts_as_success() {
    let record = run_with_shell(guarded_pipeline("test 1 -lt 1"), RunPolicy::default()).await;

    assert_eq!(record.len(), 3);
    assert_outcome(&record, "first", Outcome::Passed);
    assert_outcome(&record, "second", Outcome::Passed);
    assert_outcome(&record, "third", Outcome::Passed);
    assert!(!record.is_any_failure());
}

#[tokio::test]
async fn test_passing_guard_runs_stage() {
    let record = run_with_shell(guarded_pipeline("test 1 -eq 1"), RunPolicy::default()).await;

    assert_eq!(record.len(), 3);
    assert_outcome(&record, "first", Outcome::Passed);
    assert!(!record.is_any_failure());
}

#[tokio::test]
async fn test_skipped_stage_is_not_executed() {
    let mut pipeline = Pipeline::new("guarded");
    pipeline.add_stage(Stage::command("deploy", "would fail").with_guard("guard"));

    let runner = Arc::new(MockRunner::new().failing("guard").failing("would fail"));
    let record = run_with_mock(pipeline, runner.clone(), RunPolicy::default()).await;

    assert_eq!(runner.calls(), vec!["guard"]);
    assert_outcome(&record, "deploy", Outcome::Passed);
}

#[tokio::test]
async fn test_guard_with_missing_command_skips() {
    let mut pipeline = Pipeline::new("guarded");
    pipeline.add_stage(Stage::command("stage", "thisiserrorcommand").with_guard("nothingcommand"));

    let record = run_with_shell(pipeline, RunPolicy::default()).await;
    assert_outcome(&record, "stage", Outcome::Passed);
}

#[tokio::test]
async fn test_passing_guard_does_not_mask_failure() {
    let mut pipeline = Pipeline::new("guarded");
    pipeline.add_stage(Stage::command("stage", "thisiserrorcommand").with_guard("test 1 -eq 1"));

    let record = run_with_shell(pipeline, RunPolicy::default()).await;
    assert_outcome(&record, "stage", Outcome::Failed);
}

#[tokio::test]
async fn test_skipped_parent_still_runs_children() {
    let mut pipeline = Pipeline::new("guarded");
    pipeline.add_stage(
        Stage::command("parent", "parent cmd")
            .with_guard("guard")
            .with_child(Stage::command("child", "child cmd")),
    );

    let runner = Arc::new(MockRunner::new().failing("guard"));
    let record = run_with_mock(pipeline, runner.clone(), RunPolicy::default()).await;

    assert!(!runner.ran("parent cmd"));
    assert!(runner.ran("child cmd"));
    assert_outcome(&record, "parent", Outcome::Passed);
    assert_outcome(&record, "child", Outcome::Passed);
}
