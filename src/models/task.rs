//! # Task Model
//!
//! A task is a unit of delegated work: an identifier unique within the
//! pipeline, a kind, and a kind-specific configuration bundle. Tasks carry no
//! graph-edge state; dependencies live in [`crate::pipeline::Pipeline`].
//!
//! Payloads are inert data handed to external collaborators. The only value
//! computed per run is the export destination, whose URI templates are rendered
//! against the run's logical date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use super::template::UriTemplate;

/// Identifier of a task, unique within one pipeline
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&TaskId> for TaskId {
    fn from(id: &TaskId) -> Self {
        id.clone()
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The closed set of task kinds the pipeline delegates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    RunWarehouseQuery,
    ExportQueryResult,
    CreateComputeCluster,
    SubmitComputeJob,
    DeleteComputeCluster,
}

impl TaskKind {
    pub const ALL: [TaskKind; 5] = [
        TaskKind::RunWarehouseQuery,
        TaskKind::ExportQueryResult,
        TaskKind::CreateComputeCluster,
        TaskKind::SubmitComputeJob,
        TaskKind::DeleteComputeCluster,
    ];

    /// Name of the external collaborator that performs this kind of work
    pub fn service(&self) -> &'static str {
        match self {
            Self::RunWarehouseQuery => "warehouse",
            Self::ExportQueryResult => "storage-export",
            Self::CreateComputeCluster | Self::DeleteComputeCluster => "cluster-api",
            Self::SubmitComputeJob => "compute-job",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunWarehouseQuery => write!(f, "run-warehouse-query"),
            Self::ExportQueryResult => write!(f, "export-query-result"),
            Self::CreateComputeCluster => write!(f, "create-compute-cluster"),
            Self::SubmitComputeJob => write!(f, "submit-compute-job"),
            Self::DeleteComputeCluster => write!(f, "delete-compute-cluster"),
        }
    }
}

/// How the query result replaces the destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Truncate and replace; an eventually successful retry fully overwrites prior state
    #[default]
    Truncate,
    Append,
    WriteIfEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    NewlineDelimitedJson,
    Csv,
    Avro,
}

/// Payload for `run-warehouse-query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseQuery {
    pub destination_table: String,
    pub write_mode: WriteMode,
    pub allow_large_results: bool,
    pub use_legacy_sql: bool,
    pub query: String,
    pub on_behalf_of: Option<String>,
}

/// Payload for `export-query-result`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryExport {
    pub source_table: String,
    pub destination_uris: Vec<UriTemplate>,
    pub export_format: ExportFormat,
    pub on_behalf_of: Option<String>,
}

impl QueryExport {
    /// Destination URIs with the logical date substituted
    pub fn resolved_uris(&self, logical_date: NaiveDate) -> Vec<String> {
        self.destination_uris
            .iter()
            .map(|template| template.render(logical_date))
            .collect()
    }
}

/// Payload for `create-compute-cluster`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub cluster_name: String,
    pub project_id: Option<String>,
    pub num_workers: u32,
    pub master_machine_type: String,
    pub worker_machine_type: String,
    pub zone: String,
    pub storage_bucket: Option<String>,
    /// Engine tuning parameters, keyed `<engine>:<property>`
    pub properties: BTreeMap<String, String>,
    pub init_action_uris: Vec<String>,
    pub service_account: Option<String>,
    pub service_account_scopes: Vec<String>,
    pub connection_id: String,
    pub on_behalf_of: Option<String>,
}

/// Payload for `submit-compute-job`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeJob {
    pub cluster_name: String,
    pub main_uri: String,
}

/// Payload for `delete-compute-cluster`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterTeardown {
    pub cluster_name: String,
    pub project_id: Option<String>,
}

/// Kind-specific configuration bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "config", rename_all = "kebab-case")]
pub enum TaskPayload {
    RunWarehouseQuery(WarehouseQuery),
    ExportQueryResult(QueryExport),
    CreateComputeCluster(ClusterSpec),
    SubmitComputeJob(ComputeJob),
    DeleteComputeCluster(ClusterTeardown),
}

impl TaskPayload {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::RunWarehouseQuery(_) => TaskKind::RunWarehouseQuery,
            Self::ExportQueryResult(_) => TaskKind::ExportQueryResult,
            Self::CreateComputeCluster(_) => TaskKind::CreateComputeCluster,
            Self::SubmitComputeJob(_) => TaskKind::SubmitComputeJob,
            Self::DeleteComputeCluster(_) => TaskKind::DeleteComputeCluster,
        }
    }

    /// JSON parameters for an external executor, with per-run substitution applied
    pub fn rendered_parameters(&self, logical_date: NaiveDate) -> serde_json::Value {
        let mut value = match self {
            Self::RunWarehouseQuery(p) => serde_json::to_value(p),
            Self::ExportQueryResult(p) => serde_json::to_value(p),
            Self::CreateComputeCluster(p) => serde_json::to_value(p),
            Self::SubmitComputeJob(p) => serde_json::to_value(p),
            Self::DeleteComputeCluster(p) => serde_json::to_value(p),
        }
        .unwrap_or(serde_json::Value::Null);

        if let (Self::ExportQueryResult(export), Some(object)) = (self, value.as_object_mut()) {
            object.insert(
                "destination_uris".to_string(),
                serde_json::json!(export.resolved_uris(logical_date)),
            );
        }
        value
    }
}

/// A declared task: identifier plus kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: TaskId,
    pub payload: TaskPayload,
}

impl TaskDefinition {
    pub fn new(id: impl Into<TaskId>, payload: TaskPayload) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.payload.kind()
    }
}
