//! Scenario-based tests for stagehand

mod child_stages;
mod halt_policy;
mod run_guard;
mod yaml_pipeline;
