use thiserror::Error;

/// Error types for state machine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Invalid state transition for task {task_id}: {event} is not allowed from {from}")]
    InvalidTransition {
        task_id: String,
        from: String,
        event: String,
    },
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
