//! Test: Child Stages - sequential subtrees and outcome isolation

use crate::helpers::*;
use stagehand::core::{Outcome, Pipeline, Stage};
use stagehand::execution::{ExecutionEngine, RunPolicy};
use stagehand::process::ShellRunner;
use std::sync::Arc;

fn engine() -> ExecutionEngine<ShellRunner> {
    ExecutionEngine::new(Pipeline::new("children"), ShellRunner::default(), RunPolicy::default())
}

#[tokio::test]
async fn test_stage_with_passing_child() {
    let stage = Stage::command("test_command_stage", "ls -l").with_child(Stage::command("test_child", "ls -l"));

    let record = engine().execute_stage(&Arc::new(stage)).await;

    assert_outcome(&record, "test_command_stage", Outcome::Passed);
    assert_outcome(&record, "test_child", Outcome::Passed);
}

#[tokio::test]
async fn test_child_failure_does_not_flip_parent() {
    let stage = Stage::command("test_command_stage", "ls -l")
        .with_child(Stage::command("test_child", "nothingcommand"));

    let record = engine().execute_stage(&Arc::new(stage)).await;

    assert_outcome(&record, "test_command_stage", Outcome::Passed);
    assert_outcome(&record, "test_child", Outcome::Failed);
}

#[tokio::test]
async fn test_parent_failure_does_not_flip_children() {
    let stage = Stage::command("parent", "nothingcommand").with_child(Stage::command("child", "echo child"));

    let record = engine().execute_stage(&Arc::new(stage)).await;

    assert_outcome(&record, "parent", Outcome::Failed);
    assert_outcome(&record, "child", Outcome::Passed);
}

#[tokio::test]
async fn test_children_run_after_parent_in_order() {
    let stage = Stage::from_command("parent")
        .with_child(Stage::from_command("child 1").with_child(Stage::from_command("grandchild")))
        .with_child(Stage::from_command("child 2"));

    let mut pipeline = Pipeline::new("tree");
    pipeline.add_stage(stage);
    pipeline.add_stage(Stage::from_command("sibling root"));

    let runner = Arc::new(MockRunner::new());
    let record = run_with_mock(pipeline, runner.clone(), RunPolicy::default()).await;

    assert_eq!(
        runner.calls(),
        vec!["parent", "child 1", "grandchild", "child 2", "sibling root"]
    );
    assert_eq!(record.len(), 5);
    assert!(!record.is_any_failure());
}

#[tokio::test]
async fn test_later_children_still_run_after_a_failed_child() {
    let stage = Stage::from_command("parent")
        .with_child(Stage::from_command("bad child"))
        .with_child(Stage::from_command("good child"));

    let mut pipeline = Pipeline::new("tree");
    pipeline.add_stage(stage);

    let runner = Arc::new(MockRunner::new().failing("bad child"));
    let record = run_with_mock(pipeline, runner.clone(), RunPolicy::default()).await;

    assert!(runner.ran("good child"));
    assert_outcome(&record, "bad child", Outcome::Failed);
    assert_outcome(&record, "good child", Outcome::Passed);
    assert_outcome(&record, "parent", Outcome::Passed);
}

#[tokio::test]
async fn test_child_sharing_parent_name_keeps_parent_outcome() {
    let stage = Stage::command("shared", "echo parent").with_child(Stage::command("shared", "nothingcommand"));

    let record = engine().execute_stage(&Arc::new(stage)).await;

    // The child's continue report is merged before the parent's end report.
    assert_outcome(&record, "shared", Outcome::Passed);
}
