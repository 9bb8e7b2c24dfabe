use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution state of one task within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskRunState {
    /// Waiting for upstream tasks, a retry delay, or a free execution slot
    #[default]
    Pending,
    /// An attempt is in flight
    Running,
    /// Reached terminal success
    Success,
    /// Last attempt failed; may return to pending while the retry budget lasts
    Failed,
    /// The run was cancelled while this task was in flight
    Cancelled,
}

impl TaskRunState {
    /// Check if no further transitions are allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Cancelled)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Only success unblocks downstream tasks
    pub fn satisfies_dependencies(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for TaskRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for TaskRunState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid task run state: {s}")),
        }
    }
}
