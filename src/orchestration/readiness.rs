//! # Task Readiness
//!
//! Kahn-style readiness over a run's task states: a task is viable when it is
//! `Pending` and every upstream task has reached `Success`. Tasks behind a
//! failed or cancelled upstream are not an error; they simply stay `Pending`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::ExecutionStatus;
use crate::models::TaskId;
use crate::pipeline::Pipeline;
use crate::state_machine::TaskRunState;

/// Readiness of one task within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReadinessStatus {
    pub task_id: TaskId,
    pub current_state: TaskRunState,
    pub total_parents: usize,
    pub completed_parents: usize,
    pub dependencies_satisfied: bool,
    pub ready_for_execution: bool,
}

impl TaskReadinessStatus {
    /// Upstream tasks still holding this task back
    pub fn blocking_parents(&self) -> usize {
        self.total_parents - self.completed_parents
    }
}

/// Evaluates readiness for one run against an immutable pipeline
#[derive(Debug, Clone, Copy)]
pub struct ReadinessEvaluator<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> ReadinessEvaluator<'a> {
    pub fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    /// Readiness of a single task; `None` for ids outside the pipeline.
    ///
    /// Tasks missing from `states` are treated as `Pending`.
    pub fn evaluate(
        &self,
        task_id: &str,
        states: &BTreeMap<TaskId, TaskRunState>,
    ) -> Option<TaskReadinessStatus> {
        let task = self.pipeline.task(task_id)?;
        let state_of = |id: &str| states.get(id).copied().unwrap_or_default();

        let total_parents = self.pipeline.upstream_of(task_id).count();
        let completed_parents = self
            .pipeline
            .upstream_of(task_id)
            .filter(|parent| state_of(parent.as_str()).satisfies_dependencies())
            .count();
        let dependencies_satisfied = completed_parents == total_parents;
        let current_state = state_of(task_id);

        Some(TaskReadinessStatus {
            task_id: task.id.clone(),
            current_state,
            total_parents,
            completed_parents,
            dependencies_satisfied,
            ready_for_execution: dependencies_satisfied && current_state == TaskRunState::Pending,
        })
    }

    /// Readiness of every task, in topological order
    pub fn evaluate_all(&self, states: &BTreeMap<TaskId, TaskRunState>) -> Vec<TaskReadinessStatus> {
        self.pipeline
            .topological_order()
            .iter()
            .filter_map(|id| self.evaluate(id.as_str(), states))
            .collect()
    }

    /// Tasks that may start now, in topological order
    pub fn ready_tasks(&self, states: &BTreeMap<TaskId, TaskRunState>) -> Vec<TaskId> {
        self.evaluate_all(states)
            .into_iter()
            .filter(|status| status.ready_for_execution)
            .map(|status| status.task_id)
            .collect()
    }

    /// Run-level summary of task states.
    ///
    /// `awaiting_retry` holds failed tasks whose retry back-off has not yet
    /// elapsed; they count as in progress rather than blocking.
    pub fn execution_status(
        &self,
        states: &BTreeMap<TaskId, TaskRunState>,
        awaiting_retry: &BTreeSet<TaskId>,
    ) -> ExecutionStatus {
        let statuses = self.evaluate_all(states);

        let ready = statuses.iter().filter(|s| s.ready_for_execution).count();
        let in_progress = statuses
            .iter()
            .filter(|s| {
                s.current_state == TaskRunState::Running || awaiting_retry.contains(&s.task_id)
            })
            .count();
        let blocked = statuses
            .iter()
            .filter(|s| s.current_state.is_error() && !awaiting_retry.contains(&s.task_id))
            .count();
        let completed = statuses
            .iter()
            .filter(|s| s.current_state == TaskRunState::Success)
            .count();

        if ready > 0 {
            ExecutionStatus::HasReadyTasks
        } else if in_progress > 0 {
            ExecutionStatus::Processing
        } else if blocked > 0 {
            ExecutionStatus::BlockedByFailures
        } else if completed == statuses.len() {
            ExecutionStatus::AllComplete
        } else {
            ExecutionStatus::WaitingForDependencies
        }
    }
}
