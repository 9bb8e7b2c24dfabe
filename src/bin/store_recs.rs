//! # Store Recs CLI
//!
//! Inspect the training pipeline, validate configuration, list due runs and
//! execute a run locally with dry-run handlers.

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use store_recs::config::ConfigManager;
use store_recs::orchestration::{
    CancellationHandle, ExecutorSettings, HandlerRegistry, PipelineExecutor,
};
use store_recs::pipeline::{define_pipeline, Pipeline};
use store_recs::{init_structured_logging, RunOutcome};

#[derive(Parser, Debug)]
#[command(name = "store-recs")]
#[command(about = "Store recommendations training pipeline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration directory (default: $STORE_RECS_CONFIG_DIR or ./config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Environment overlay to load (default: $STORE_RECS_ENV or development)
    #[arg(short, long)]
    environment: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print tasks in execution order with their upstream dependencies
    Plan {
        /// Print the full pipeline, payloads included, as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load configuration and build the pipeline
    ValidateConfig,

    /// List logical dates whose runs are due
    Schedule {
        /// Last day to consider (default: today, UTC)
        #[arg(long, value_name = "YYYY-MM-DD")]
        through: Option<NaiveDate>,
    },

    /// Execute one run with handlers that only log what they would do
    DryRun {
        /// Logical date of the run
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: NaiveDate,

        /// Override pipeline.max_active_tasks
        #[arg(long)]
        max_active_tasks: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let cli = Cli::parse();
    let environment = cli
        .environment
        .unwrap_or_else(ConfigManager::detect_environment);

    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir, &environment)
        .context("failed to load configuration")?;
    let config = manager.config();
    let pipeline = define_pipeline(config).context("failed to define pipeline")?;

    match cli.command {
        Commands::Plan { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&pipeline)?);
            } else {
                print_plan(&pipeline);
            }
        }
        Commands::ValidateConfig => {
            println!(
                "Configuration OK: environment={} dir={} dag={} tasks={} edges={}",
                manager.environment(),
                manager.config_directory().display(),
                pipeline.dag_id(),
                pipeline.task_count(),
                pipeline.edge_count()
            );
            println!("{}", serde_json::to_string_pretty(&manager.debug_config())?);
        }
        Commands::Schedule { through } => {
            let today = through.unwrap_or_else(|| Utc::now().date_naive());
            let due = pipeline
                .schedule()
                .due_logical_dates(pipeline.start_date(), today);
            info!(count = due.len(), through = %today, "Due logical dates computed");
            for date in due {
                println!("{}", date.format("%Y-%m-%d"));
            }
        }
        Commands::DryRun {
            date,
            max_active_tasks,
        } => {
            let mut settings = ExecutorSettings::from_config(config);
            if let Some(limit) = max_active_tasks {
                settings = settings.with_max_concurrency(limit);
            }

            let (handlers, _) = HandlerRegistry::with_dry_run();
            let executor = PipelineExecutor::new(Arc::new(pipeline), handlers, settings)?;

            let cancel = CancellationHandle::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received - cancelling run");
                    on_interrupt.cancel();
                }
            });

            let report = executor.execute(date, cancel).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if report.outcome != RunOutcome::Succeeded {
                bail!(
                    "run {} for {} finished {} ({})",
                    report.context.run_id,
                    report.context.ds(),
                    report.outcome,
                    report.execution_status
                );
            }
        }
    }

    Ok(())
}

fn print_plan(pipeline: &Pipeline) {
    println!(
        "{} ({} from {})",
        pipeline.dag_id(),
        pipeline.schedule(),
        pipeline.start_date()
    );
    for (position, task_id) in pipeline.topological_order().iter().enumerate() {
        let kind = pipeline
            .task(task_id.as_str())
            .map(|task| task.kind().to_string())
            .unwrap_or_default();
        let upstream: Vec<&str> = pipeline
            .upstream_of(task_id.as_str())
            .map(|id| id.as_str())
            .collect();
        let upstream = if upstream.is_empty() {
            "-".to_string()
        } else {
            upstream.join(", ")
        };
        let name = task_id.as_str();
        println!("{:>2}. {name:<24} {kind:<24} after: {upstream}", position + 1);
    }
    for teardown in pipeline.teardowns() {
        println!("teardown: {} releases {}", teardown.task, teardown.resource);
    }
}
