mod simulate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fanout_core::{
    ExecutionResult, ExecutionSummary, ExecutorConfig, MetricsSnapshot, ParallelExecutor,
    SharedProgress, TaskSpec, WaveObserver,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::simulate::SimulatedExecutor;

#[derive(Debug, Parser)]
#[command(name = "fanout", version, about = "Run task waves through the parallel executor")]
struct Cli {
    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute a JSON plan of waves with the simulated executor.
    Run {
        /// Plan file: `{ "waves": [[{ "id": "...", "payload": {...} }]] }`
        #[arg(long)]
        plan: PathBuf,

        /// Executor config file (JSON). Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Deserialize)]
struct Plan {
    waves: Vec<Vec<TaskSpec>>,
}

#[derive(Debug, Serialize)]
struct Report {
    summary: ExecutionSummary,
    metrics: MetricsSnapshot,
    results: Vec<ExecutionResult<serde_json::Value>>,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_plan(path: &Path) -> anyhow::Result<Plan> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading plan {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing plan {}", path.display()))
}

async fn run(plan_path: &Path, config_path: Option<&Path>) -> anyhow::Result<Report> {
    let plan = load_plan(plan_path)?;
    let config = match config_path {
        Some(path) => ExecutorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ExecutorConfig::default(),
    };

    tracing::info!(
        waves = plan.waves.len(),
        tasks = plan.waves.iter().map(Vec::len).sum::<usize>(),
        concurrency = config.concurrency,
        "Loaded plan"
    );

    let parallel = ParallelExecutor::new(config)?;
    let progress: SharedProgress<serde_json::Value> = Arc::new(
        |done: usize, total: usize, result: &ExecutionResult<serde_json::Value>| {
            tracing::info!(
                done,
                total,
                task_id = %result.task_id,
                success = result.success,
                retries = result.retries,
                "Task finished"
            );
        },
    );
    let on_wave: &dyn WaveObserver<serde_json::Value> =
        &|index: usize, results: &[ExecutionResult<serde_json::Value>]| {
            let summary = ExecutionSummary::from_results(results);
            tracing::info!(
                wave = index,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Wave done"
            );
        };

    let results = parallel
        .execute_waves(
            plan.waves,
            Arc::new(SimulatedExecutor::default()),
            Some(on_wave),
            Some(progress),
        )
        .await;

    Ok(Report {
        summary: ExecutionSummary::from_results(&results),
        metrics: parallel.metrics(),
        results,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Run { plan, config } => {
            let report = run(&plan, config.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.summary.all_succeeded() {
                tracing::warn!(failed = report.summary.failed, "Some tasks failed");
            }
        }
    }

    Ok(())
}
