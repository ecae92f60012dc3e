//! Test: Halt Policy - what a failing root stage does to the rest of the run

use crate::helpers::*;
use stagehand::core::{Outcome, Stage};
use stagehand::execution::RunPolicy;
use std::sync::Arc;

#[tokio::test]
async fn test_flag_off_halts_remaining_stages() {
    let record = run_with_shell(
        pipeline_of(&["echo foobar", "thisiserrorcommand", "echo foobar2"]),
        RunPolicy::new(false),
    )
    .await;

    assert_outcome(&record, "echo foobar", Outcome::Passed);
    assert_outcome(&record, "thisiserrorcommand", Outcome::Failed);
    assert_outcome(&record, "echo foobar2", Outcome::Failed);
    assert!(record.is_any_failure());
}

#[tokio::test]
async fn test_flag_on_runs_every_stage() {
    let record = run_with_shell(
        pipeline_of(&["echo foobar", "thisiserrorcommand", "echo foobar2"]),
        RunPolicy::new(true),
    )
    .await;

    assert_outcome(&record, "echo foobar", Outcome::Passed);
    assert_outcome(&record, "thisiserrorcommand", Outcome::Failed);
    assert_outcome(&record, "echo foobar2", Outcome::Passed);
    assert!(record.is_any_failure());
}

#[tokio::test]
async fn test_halted_stages_are_never_executed() {
    let runner = Arc::new(MockRunner::new().failing("b"));
    let record = run_with_mock(pipeline_of(&["a", "b", "c", "d"]), runner.clone(), RunPolicy::default()).await;

    assert_eq!(runner.calls(), vec!["a", "b"]);
    assert_outcome(&record, "a", Outcome::Passed);
    assert_outcome(&record, "b", Outcome::Failed);
    assert_outcome(&record, "c", Outcome::Failed);
    assert_outcome(&record, "d", Outcome::Failed);
}

#[tokio::test]
async fn test_flag_on_executes_every_stage_genuinely() {
    let runner = Arc::new(MockRunner::new().failing("a").failing("c"));
    let record = run_with_mock(pipeline_of(&["a", "b", "c", "d"]), runner.clone(), RunPolicy::new(true)).await;

    assert_eq!(runner.calls(), vec!["a", "b", "c", "d"]);
    assert_outcome(&record, "a", Outcome::Failed);
    assert_outcome(&record, "b", Outcome::Passed);
    assert_outcome(&record, "c", Outcome::Failed);
    assert_outcome(&record, "d", Outcome::Passed);
}

#[tokio::test]
async fn test_halt_marks_children_of_undispatched_stages() {
    let mut pipeline = pipeline_of(&["fails"]);
    pipeline.add_stage(Stage::from_command("later").with_child(Stage::from_command("later child")));

    let runner = Arc::new(MockRunner::new().failing("fails"));
    let record = run_with_mock(pipeline, runner.clone(), RunPolicy::default()).await;

    assert!(!runner.ran("later"));
    assert!(!runner.ran("later child"));
    assert_outcome(&record, "later", Outcome::Failed);
    assert_outcome(&record, "later child", Outcome::Failed);
}

#[tokio::test]
async fn test_child_failure_halts_later_roots() {
    let mut pipeline = pipeline_of(&[]);
    pipeline.add_stage(Stage::from_command("parent").with_child(Stage::from_command("broken child")));
    pipeline.add_stage(Stage::from_command("next"));

    let runner = Arc::new(MockRunner::new().failing("broken child"));
    let record = run_with_mock(pipeline, runner.clone(), RunPolicy::default()).await;

    assert_outcome(&record, "parent", Outcome::Passed);
    assert_outcome(&record, "broken child", Outcome::Failed);
    assert_outcome(&record, "next", Outcome::Failed);
    assert!(!runner.ran("next"));
}

#[tokio::test]
async fn test_failure_in_last_stage_halts_nothing_else() {
    let runner = Arc::new(MockRunner::new().failing("c"));
    let record = run_with_mock(pipeline_of(&["a", "b", "c"]), runner.clone(), RunPolicy::default()).await;

    assert_eq!(record.len(), 3);
    assert_eq!(record.failures(), vec!["c"]);
}
