//! CLI output formatting

use crate::{
    core::{config::StageConfig, Outcome, ResultRecord},
    report::{ReportError, Reporter, RunEvent},
};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format an outcome for display
pub fn format_outcome(outcome: Outcome) -> String {
    match outcome {
        Outcome::Passed => style("PASSED").green().to_string(),
        Outcome::Failed => style("FAILED").red().to_string(),
    }
}

/// Format a run event for display
pub fn format_run_event(event: &RunEvent) -> String {
    match event {
        RunEvent::RunStarted {
            run_id,
            pipeline,
            stages,
        } => format!(
            "{} Starting pipeline {} with {} stage(s) ({})",
            ROCKET,
            style(pipeline).bold(),
            style(stages).cyan(),
            style(&run_id.to_string()[..8]).dim()
        ),
        RunEvent::StageSkipped { stage } => {
            format!("{} {} (run guard not met)", SKIP, style(stage).dim())
        }
        RunEvent::StageFinished { stage, outcome, .. } => match outcome {
            Outcome::Passed => format!("{} {}", CHECK, style(stage).green()),
            Outcome::Failed => format!("{} {}", CROSS, style(stage).red()),
        },
        RunEvent::StageHalted { stage } => {
            format!("{} {} (not run)", WARN, style(stage).yellow())
        }
        RunEvent::RunFinished {
            run_id,
            pipeline,
            success,
        } => {
            let status = if *success {
                format!("{} completed", style("successfully").green())
            } else {
                style("failed").red().to_string()
            };
            format!(
                "{} Pipeline {} ({}) {}",
                INFO,
                style(pipeline).bold(),
                style(&run_id.to_string()[..8]).dim(),
                status
            )
        }
    }
}

/// Format a result record as one line per stage
pub fn format_outcomes(record: &ResultRecord) -> String {
    record
        .outcomes
        .iter()
        .map(|(name, outcome)| format!("  {} {}\n", format_outcome(*outcome), name))
        .collect()
}

/// Format a configured stage tree, children indented under their parent
pub fn format_stage_tree(stages: &[StageConfig]) -> String {
    fn walk(stages: &[StageConfig], depth: usize, out: &mut String) {
        for stage in stages {
            let guard = stage
                .only_if
                .as_deref()
                .map(|g| format!(" {}", style(format!("[only if: {}]", g)).dim()))
                .unwrap_or_default();
            out.push_str(&format!(
                "{}- {}{}\n",
                "  ".repeat(depth + 1),
                style(&stage.name).cyan(),
                guard
            ));
            walk(&stage.run_after, depth + 1, out);
        }
    }

    let mut out = String::new();
    walk(stages, 0, &mut out);
    out
}

/// Prints every run event to stdout as it happens
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, event: &RunEvent) -> Result<(), ReportError> {
        println!("{}", format_run_event(event));
        Ok(())
    }
}
