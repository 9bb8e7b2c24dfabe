//! # Run Model
//!
//! A run is one execution instance of the pipeline keyed by its logical date.
//! The context travels with every task invocation; the report is what the
//! executor hands back once the run has settled.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::task::TaskId;
use crate::constants::ExecutionStatus;
use crate::state_machine::{TaskRunState, TaskTransition};

/// Identity of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: Uuid,
    pub dag_id: String,
    pub logical_date: NaiveDate,
    pub triggered_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new(dag_id: impl Into<String>, logical_date: NaiveDate) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            dag_id: dag_id.into(),
            logical_date,
            triggered_at: Utc::now(),
        }
    }

    /// Logical date as `YYYY-MM-DD`
    pub fn ds(&self) -> String {
        self.logical_date.format("%Y-%m-%d").to_string()
    }

    /// Logical date as `YYYYMMDD`
    pub fn ds_nodash(&self) -> String {
        self.logical_date.format("%Y%m%d").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded,
    Failed,
    Cancelled,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Final record of one task within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRunSummary {
    pub state: TaskRunState,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub output: Option<serde_json::Value>,
    pub transitions: Vec<TaskTransition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub context: RunContext,
    pub outcome: RunOutcome,
    pub execution_status: ExecutionStatus,
    pub tasks: BTreeMap<TaskId, TaskRunSummary>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn state_of(&self, task_id: &str) -> Option<TaskRunState> {
        self.tasks.get(task_id).map(|summary| summary.state)
    }

    pub fn attempts_of(&self, task_id: &str) -> u32 {
        self.tasks.get(task_id).map_or(0, |summary| summary.attempts)
    }

    /// Tasks that never left pending, in id order
    pub fn pending_tasks(&self) -> Vec<&TaskId> {
        self.tasks
            .iter()
            .filter(|(_, summary)| summary.state == TaskRunState::Pending)
            .map(|(id, _)| id)
            .collect()
    }
}
