//! # Pipeline Configuration
//!
//! Everything the pipeline hands to external collaborators is configuration:
//! table names, URI templates, cluster sizing, the training script location,
//! and the retry budget. Defaults reproduce the production training DAG.
//! Identities (delegated user, service account, project) and notification
//! addresses have no defaults; they are looked up from the environment when
//! the configuration is loaded.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use store_recs::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let retries = manager.config().retry.retries;
//! let cluster = &manager.config().cluster.name;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{ExportFormat, UriTemplate, WriteMode};
use crate::schedule::Schedule;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Query bundled with the crate, used unless `warehouse.query_file` is set
pub const DEFAULT_TRAINING_QUERY: &str = include_str!("../../sql/store_recs_train.sql");

/// Root configuration structure mirroring `config/pipeline.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub pipeline: PipelineSettings,
    pub retry: RetryConfig,
    pub notifications: NotificationConfig,
    pub identity: IdentityConfig,
    pub warehouse: WarehouseConfig,
    pub export: ExportConfig,
    pub cluster: ClusterConfig,
    pub job: JobConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub dag_id: String,
    pub owner: String,
    pub schedule: Schedule,
    pub start_date: NaiveDate,
    /// Upper bound on tasks running at once within a run
    pub max_active_tasks: usize,
    /// Run the cluster teardown as a finally-step even when the graph stops early
    pub guaranteed_teardown: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            dag_id: crate::constants::DEFAULT_DAG_ID.to_string(),
            owner: "data-science".to_string(),
            schedule: Schedule::Daily,
            start_date: NaiveDate::from_ymd_opt(2017, 12, 4).unwrap_or_default(),
            max_active_tasks: 4,
            guaranteed_teardown: false,
        }
    }
}

/// Retry budget handed to the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub retries: u32,
    pub retry_delay_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 5,
            retry_delay_seconds: 300,
        }
    }
}

impl RetryConfig {
    /// Total attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub emails: Vec<String>,
    pub email_on_failure: bool,
    pub email_on_retry: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            emails: Vec::new(),
            email_on_failure: true,
            email_on_retry: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// User the delegated calls act on behalf of
    pub delegate_to: Option<String>,
    pub service_account: Option<String>,
    pub service_account_scopes: Vec<String>,
    pub connection_id: String,
    pub project_id: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            delegate_to: None,
            service_account: None,
            service_account_scopes: vec!["https://www.googleapis.com/auth/cloud-platform".to_string()],
            connection_id: "google-cloud-default".to_string(),
            project_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WarehouseConfig {
    pub destination_table: String,
    pub write_mode: WriteMode,
    pub allow_large_results: bool,
    pub use_legacy_sql: bool,
    pub query_file: Option<PathBuf>,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            destination_table: "data_science.store_recs_train".to_string(),
            write_mode: WriteMode::Truncate,
            allow_large_results: true,
            use_legacy_sql: false,
            query_file: None,
        }
    }
}

impl WarehouseConfig {
    /// Query text from `query_file`, or the bundled training query
    pub fn query_text(&self) -> ConfigResult<String> {
        match &self.query_file {
            Some(path) => read_query_file(path),
            None => Ok(DEFAULT_TRAINING_QUERY.to_string()),
        }
    }
}

fn read_query_file(path: &Path) -> ConfigResult<String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigurationError::file_read_error(path.display().to_string(), e))?;
    if text.trim().is_empty() {
        return Err(ConfigurationError::invalid_value(
            "warehouse.query_file",
            path.display().to_string(),
            "query file is empty",
        ));
    }
    Ok(text)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Defaults to `warehouse.destination_table`
    pub source_table: Option<String>,
    pub destination_uri_templates: Vec<UriTemplate>,
    pub export_format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let default_uri = "gs://store_recs/development/training/{{ ds }}/store_recs_train_*.json";
        Self {
            source_table: None,
            destination_uri_templates: UriTemplate::parse(default_uri).into_iter().collect(),
            export_format: ExportFormat::NewlineDelimitedJson,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub name: String,
    pub num_workers: u32,
    pub master_machine_type: String,
    pub worker_machine_type: String,
    pub zone: String,
    pub storage_bucket: Option<String>,
    pub init_action_uris: Vec<String>,
    pub properties: BTreeMap<String, String>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        let properties = [
            ("spark:spark.executor.instances", "74"),
            ("spark:spark.yarn.executor.memoryOverhead", "2048"),
            ("spark:spark.yarn.driver.memoryOverhead", "3072"),
            ("spark:spark.executor.cores", "5"),
            ("spark:spark.driver.cores", "14"),
            ("spark:spark.default.parallelism", "800"),
            ("yarn:yarn.scheduler.maximum-allocation-mb", "50000"),
            ("yarn:yarn.nodemanager.resource.memory-mb", "50000"),
            ("spark:spark.driver.maxResultSize", "55g"),
            ("spark:spark.driver.memory", "19g"),
            ("spark:spark.executor.memory", "19g"),
            ("spark:spark.executor.extraJavaOptions", "-XX:+PrintGCDetails"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            name: "cluster-1".to_string(),
            num_workers: 25,
            master_machine_type: "n1-standard-16".to_string(),
            worker_machine_type: "n1-standard-16".to_string(),
            zone: "us-central1-b".to_string(),
            storage_bucket: Some("data-science".to_string()),
            init_action_uris: vec!["gs://initialization-actions/create-my-cluster.sh".to_string()],
            properties,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct JobConfig {
    pub main_uri: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            main_uri: "gs://store_recs/development/model/spark_store_recs_v2.py".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Validate the merged configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pipeline.dag_id.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "pipeline.dag_id",
                "",
                "dag id must not be empty",
            ));
        }

        if self.pipeline.max_active_tasks == 0 {
            return Err(ConfigurationError::invalid_value(
                "pipeline.max_active_tasks",
                "0",
                "at least one task must be allowed to run",
            ));
        }

        if self.cluster.name.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "cluster.name",
                "",
                "cluster name must not be empty",
            ));
        }

        if self.cluster.num_workers == 0 {
            return Err(ConfigurationError::invalid_value(
                "cluster.num_workers",
                "0",
                "a cluster needs at least one worker",
            ));
        }

        if self.export.destination_uri_templates.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "export.destination_uri_templates",
                "[]",
                "at least one destination is required",
            ));
        }

        if let Some(template) = self
            .export
            .destination_uri_templates
            .iter()
            .find(|t| !t.has_date_token())
        {
            return Err(ConfigurationError::invalid_value(
                "export.destination_uri_templates",
                template.as_str(),
                "each destination must contain a {{ ds }} or {{ ds_nodash }} token",
            ));
        }

        if self.job.main_uri.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "job.main_uri",
                "",
                "training script location must not be empty",
            ));
        }

        if let Some(path) = &self.warehouse.query_file {
            read_query_file(path)?;
        }

        if self.notifications.emails.is_empty()
            && (self.notifications.email_on_failure || self.notifications.email_on_retry)
        {
            tracing::warn!(
                "Notifications are enabled but no addresses are configured; set STORE_RECS__NOTIFICATIONS__EMAILS"
            );
        }

        Ok(())
    }

    /// Source table for the export, falling back to the query destination
    pub fn export_source_table(&self) -> &str {
        self.export
            .source_table
            .as_deref()
            .unwrap_or(&self.warehouse.destination_table)
    }
}
