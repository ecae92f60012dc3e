use anyhow::{Context, Result};
use stagehand::cli::commands::{RunCommand, ValidateCommand};
use stagehand::cli::output::*;
use stagehand::cli::{Cli, Command};
use stagehand::core::config::PipelineConfig;
use stagehand::core::ResultRecord;
use stagehand::execution::{ExecutionEngine, RunReport};
use stagehand::process::ShellRunner;
use stagehand::report::{NoopReporter, Reporter};
use std::sync::Arc;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let success = match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
    };

    if !success {
        std::process::exit(1);
    }

    Ok(())
}

async fn run_pipeline(cmd: &RunCommand) -> Result<bool> {
    let config = PipelineConfig::from_file(&cmd.file).context("Failed to load pipeline config")?;

    let mut policy = config.policy();
    if cmd.halt_early_when_no_failure_stop {
        policy.halt_early_when_no_failure_stop = true;
    }

    // JSON output owns stdout, so lifecycle events are only logged.
    let reporter: Arc<dyn Reporter> = if cmd.json {
        Arc::new(NoopReporter)
    } else {
        Arc::new(ConsoleReporter)
    };
    let pipeline = config
        .to_pipeline()
        .context("Failed to build pipeline")?
        .with_reporter(reporter);

    if !cmd.json {
        println!("{} Loaded pipeline: {}", INFO, style(&pipeline.name).bold());
    }

    let engine = ExecutionEngine::new(pipeline, ShellRunner::default(), policy);

    let report = match &cmd.stage {
        Some(name) => {
            let stage = engine
                .pipeline()
                .stage(name)
                .cloned()
                .with_context(|| format!("No root stage named '{}'", name))?;
            let outcomes = engine.execute_stage(&stage).await;
            let cleanup = if engine.pipeline().cleanup.is_empty() {
                None
            } else {
                Some(engine.run_cleanup().await)
            };
            RunReport { outcomes, cleanup }
        }
        None => engine.run().await,
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&engine.pipeline().name, &report);
    }

    if !report.is_success() {
        error!("Failed stages: {}", report.outcomes.failures().join(", "));
    }

    Ok(report.is_success())
}

fn print_report(name: &str, report: &RunReport) {
    println!("\n{} Results for {}:", INFO, style(name).bold());
    print!("{}", format_outcomes(&report.outcomes));

    if let Some(cleanup) = &report.cleanup {
        println!("{} Cleanup:", INFO);
        print!("{}", format_outcomes(cleanup));
        warn_cleanup_failures(cleanup);
    }

    if report.is_success() {
        println!(
            "\n{} {} completed {}",
            CHECK,
            style(name).bold(),
            style("successfully").green()
        );
    } else {
        println!("\n{} {} {}", CROSS, style(name).bold(), style("failed").red());
    }
}

fn warn_cleanup_failures(cleanup: &ResultRecord) {
    if cleanup.is_any_failure() {
        println!(
            "{} Cleanup stages failed: {}",
            WARN,
            style(cleanup.failures().join(", ")).yellow()
        );
    }
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<bool> {
    println!("{} Validating pipeline...", INFO);

    match PipelineConfig::from_file(&cmd.file) {
        Ok(config) => {
            println!("{} Pipeline configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Stages: {}", style(config.stage_count()).cyan());
            println!(
                "  Halt early when no failure stop: {}",
                style(config.halt_early_when_no_failure_stop).cyan()
            );
            print!("{}", format_stage_tree(&config.pipeline));
            if !config.cleanup.is_empty() {
                println!("  Cleanup:");
                print!("{}", format_stage_tree(&config.cleanup));
            }

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(true)
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            Ok(false)
        }
    }
}
