#![allow(clippy::doc_markdown)] // Allow technical terms like BigQuery, Dataproc in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Store Recommendations Pipeline
//!
//! The daily training pipeline for store recommendations, expressed as an
//! immutable task graph plus an async executor that honours its ordering
//! contract.
//!
//! ## Overview
//!
//! One run per logical date:
//!
//! 1. `write-training-table` materializes recent transactions joined against
//!    the curated store list into a warehouse table
//! 2. `export-training-table` exports that table to date-stamped storage URIs
//! 3. `create-cluster` brings up a transient compute cluster (concurrently with 1)
//! 4. `submit-training-job` runs the training script once 2 and 3 succeeded
//! 5. `delete-cluster` tears the cluster down after the job succeeded
//!
//! The actual work of every task is delegated to an external service through a
//! [`TaskHandler`](orchestration::TaskHandler).
//!
//! ## Module Organization
//!
//! - [`config`] - Layered configuration (TOML files plus `STORE_RECS__*` environment)
//! - [`pipeline`] - Graph builder, validation and the training DAG definition
//! - [`models`] - Task payloads, URI templates and run records
//! - [`state_machine`] - Per-run task state transitions
//! - [`orchestration`] - Readiness evaluation and the executor
//! - [`schedule`] - Trigger intervals and due logical dates
//! - [`events`] - Lifecycle event broadcasting
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use store_recs::config::ConfigManager;
//! use store_recs::orchestration::{
//!     CancellationHandle, ExecutorSettings, HandlerRegistry, PipelineExecutor,
//! };
//! use store_recs::pipeline::define_pipeline;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//! let pipeline = Arc::new(define_pipeline(config)?);
//!
//! let (handlers, _) = HandlerRegistry::with_dry_run();
//! let executor =
//!     PipelineExecutor::new(pipeline, handlers, ExecutorSettings::from_config(config))?;
//!
//! let date = chrono::NaiveDate::from_ymd_opt(2017, 12, 4).unwrap();
//! let report = executor.execute(date, CancellationHandle::new()).await?;
//! println!("run {} {}", report.context.run_id, report.outcome);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod pipeline;
pub mod schedule;
pub mod state_machine;

pub use config::{ConfigManager, ConfigurationError, PipelineConfig};
pub use constants::{task_ids, ExecutionStatus};
pub use error::{ExternalServiceError, PipelineError, Result};
pub use logging::init_structured_logging;
pub use models::{RunContext, RunOutcome, RunReport, TaskDefinition, TaskId, TaskKind};
pub use pipeline::{define_pipeline, Pipeline, PipelineBuilder};
pub use schedule::Schedule;
pub use state_machine::TaskRunState;
