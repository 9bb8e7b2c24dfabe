//! # Pipeline Constants
//!
//! Canonical task identifiers, defaults and lifecycle event names for the
//! store recommendations training pipeline.

use serde::{Deserialize, Serialize};

/// Identifier of the pipeline as seen by the scheduler.
pub const DEFAULT_DAG_ID: &str = "store_recs_dag_v7";

/// Task identifiers, one per node of the training graph.
pub mod task_ids {
    pub const WRITE_TRAINING_TABLE: &str = "write-training-table";
    pub const EXPORT_TRAINING_TABLE: &str = "export-training-table";
    pub const CREATE_CLUSTER: &str = "create-cluster";
    pub const SUBMIT_TRAINING_JOB: &str = "submit-training-job";
    pub const DELETE_CLUSTER: &str = "delete-cluster";

    /// All task ids in declaration order
    pub const ALL: [&str; 5] = [
        WRITE_TRAINING_TABLE,
        EXPORT_TRAINING_TABLE,
        CREATE_CLUSTER,
        SUBMIT_TRAINING_JOB,
        DELETE_CLUSTER,
    ];
}

/// Lifecycle events published while a run executes
pub mod events {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";
    pub const RUN_CANCEL_REQUESTED: &str = "run.cancel_requested";

    pub const TASK_STARTED: &str = "task.started";
    pub const TASK_SUCCEEDED: &str = "task.succeeded";
    pub const TASK_FAILED: &str = "task.failed";
    pub const TASK_RETRY_SCHEDULED: &str = "task.retry_scheduled";
    pub const TASK_RETRY_DUE: &str = "task.retry_due";
    pub const TASK_CANCELLED: &str = "task.cancelled";
    pub const TASK_TEARDOWN_FORCED: &str = "task.teardown_forced";
}

/// Token substituted with the run's logical date as `YYYY-MM-DD`
pub const DS_TOKEN: &str = "ds";
/// Token substituted with the run's logical date as `YYYYMMDD`
pub const DS_NODASH_TOKEN: &str = "ds_nodash";

/// Run-level view of task states used for orchestration decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    HasReadyTasks,
    Processing,
    BlockedByFailures,
    AllComplete,
    WaitingForDependencies,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HasReadyTasks => write!(f, "has_ready_tasks"),
            Self::Processing => write!(f, "processing"),
            Self::BlockedByFailures => write!(f, "blocked_by_failures"),
            Self::AllComplete => write!(f, "all_complete"),
            Self::WaitingForDependencies => write!(f, "waiting_for_dependencies"),
        }
    }
}
