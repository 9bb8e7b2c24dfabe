use serde::{Deserialize, Serialize};

/// Events that drive task run state transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TaskRunEvent {
    /// Begin a new attempt
    Start,
    /// The attempt finished successfully
    Succeed,
    /// The attempt failed with the given message
    Fail(String),
    /// Return a failed task to pending for another attempt
    Retry,
    /// Stop an in-flight attempt because the run was cancelled
    Cancel,
}

impl TaskRunEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Succeed => "succeed",
            Self::Fail(_) => "fail",
            Self::Retry => "retry",
            Self::Cancel => "cancel",
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn fail_with_error(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }
}
