use super::{
    errors::{StateMachineError, StateMachineResult},
    events::TaskRunEvent,
    states::TaskRunState,
};
use crate::models::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded state change of a task within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTransition {
    pub from_state: TaskRunState,
    pub to_state: TaskRunState,
    pub event: String,
    pub attempt: u32,
    pub error_message: Option<String>,
    pub sort_key: u32,
    pub occurred_at: DateTime<Utc>,
}

/// In-memory state machine for one task execution record of a run.
///
/// Owned exclusively by the executor control loop, so transitions never race.
#[derive(Debug, Clone)]
pub struct TaskStateMachine {
    task_id: TaskId,
    current: TaskRunState,
    attempts: u32,
    transitions: Vec<TaskTransition>,
}

impl TaskStateMachine {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            current: TaskRunState::default(),
            attempts: 0,
            transitions: Vec::new(),
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn current_state(&self) -> TaskRunState {
        self.current
    }

    /// Number of attempts started so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn transitions(&self) -> &[TaskTransition] {
        &self.transitions
    }

    /// Error message of the most recent failure, if any
    pub fn last_error(&self) -> Option<&str> {
        self.transitions
            .iter()
            .rev()
            .find_map(|t| t.error_message.as_deref())
    }

    /// Attempt to transition the task state
    pub fn transition(&mut self, event: TaskRunEvent) -> StateMachineResult<TaskRunState> {
        let from_state = self.current;
        let to_state = self.determine_target_state(from_state, &event)?;

        if matches!(event, TaskRunEvent::Start) {
            self.attempts += 1;
        }

        self.transitions.push(TaskTransition {
            from_state,
            to_state,
            event: event.event_type().to_string(),
            attempt: self.attempts,
            error_message: event.error_message().map(str::to_string),
            sort_key: self.transitions.len() as u32 + 1,
            occurred_at: Utc::now(),
        });
        self.current = to_state;

        tracing::debug!(
            task_id = %self.task_id,
            from = %from_state,
            to = %to_state,
            event = event.event_type(),
            attempt = self.attempts,
            "Task state transition"
        );

        Ok(to_state)
    }

    /// Determine the target state based on current state and event
    pub fn determine_target_state(
        &self,
        current_state: TaskRunState,
        event: &TaskRunEvent,
    ) -> StateMachineResult<TaskRunState> {
        let target = match (current_state, event) {
            (TaskRunState::Pending, TaskRunEvent::Start) => TaskRunState::Running,
            (TaskRunState::Running, TaskRunEvent::Succeed) => TaskRunState::Success,
            (TaskRunState::Running, TaskRunEvent::Fail(_)) => TaskRunState::Failed,
            (TaskRunState::Running, TaskRunEvent::Cancel) => TaskRunState::Cancelled,
            (TaskRunState::Failed, TaskRunEvent::Retry) => TaskRunState::Pending,

            (from_state, _) => {
                return Err(StateMachineError::InvalidTransition {
                    task_id: self.task_id.to_string(),
                    from: from_state.to_string(),
                    event: event.event_type().to_string(),
                })
            }
        };

        Ok(target)
    }
}
