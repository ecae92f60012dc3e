//! Test: YAML Pipeline - configuration loaded from disk and run end to end

use crate::helpers::*;
use stagehand::core::config::PipelineConfig;
use stagehand::core::Outcome;
use stagehand::execution::ExecutionEngine;
use stagehand::process::ShellRunner;

const PIPELINE: &str = r#"
name: deploy
pipeline:
  - name: build
    command: echo build
    run_after:
      - name: package
        command: test "$STAGEHAND_TEST_TARGET" = production
  - name: broken
    command: thisiserrorcommand
  - name: release
    command: echo release
cleanup:
  - name: tidy
    command: echo tidy
"#;

#[tokio::test]
async fn test_yaml_pipeline_runs_with_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.yml");
    std::fs::write(&path, PIPELINE).unwrap();

    let config = PipelineConfig::from_file(&path).unwrap();
    let pipeline = config
        .to_pipeline_with_env(|key| (key == "STAGEHAND_TEST_TARGET").then(|| "production".to_string()))
        .unwrap();

    let engine = ExecutionEngine::new(pipeline, ShellRunner::default(), config.policy());
    let report = engine.run().await;

    assert!(!report.is_success());
    assert_outcome(&report.outcomes, "build", Outcome::Passed);
    assert_outcome(&report.outcomes, "package", Outcome::Passed);
    assert_outcome(&report.outcomes, "broken", Outcome::Failed);
    assert_outcome(&report.outcomes, "release", Outcome::Failed);

    let cleanup = report.cleanup.expect("cleanup should run");
    assert_outcome(&cleanup, "tidy", Outcome::Passed);
}

#[tokio::test]
async fn test_yaml_flag_keeps_running() {
    let yaml = PIPELINE.replace("name: deploy", "name: deploy\nhalt_early_when_no_failure_stop: true");
    let config = PipelineConfig::from_yaml(&yaml).unwrap();
    let pipeline = config.to_pipeline_with_env(|_| None).unwrap();

    let report = ExecutionEngine::new(pipeline, ShellRunner::default(), config.policy())
        .run()
        .await;

    assert_outcome(&report.outcomes, "release", Outcome::Passed);
    assert_outcome(&report.outcomes, "package", Outcome::Failed);
}
