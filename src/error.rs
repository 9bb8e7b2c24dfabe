//! Error types for pipeline definition and execution.

use thiserror::Error;

use crate::config::ConfigurationError;
use crate::state_machine::StateMachineError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Configuration error: dependency references undeclared task '{task_id}'")]
    UnknownTask { task_id: String },
    #[error("Configuration error: task '{task_id}' is declared more than once")]
    DuplicateTask { task_id: String },
    #[error("Configuration error: dependency cycle detected involving task '{task_id}'")]
    CycleDetected { task_id: String },
    #[error("Configuration error: no handler registered for task kind '{kind}'")]
    HandlerNotRegistered { kind: String },
    #[error("State transition error: {0}")]
    StateTransition(String),
    #[error(transparent)]
    ExternalService(#[from] ExternalServiceError),
}

impl PipelineError {
    /// Errors raised while defining or wiring the pipeline, never at run time.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationError(_)
                | Self::UnknownTask { .. }
                | Self::DuplicateTask { .. }
                | Self::CycleDetected { .. }
                | Self::HandlerNotRegistered { .. }
        )
    }
}

impl From<ConfigurationError> for PipelineError {
    fn from(error: ConfigurationError) -> Self {
        PipelineError::ConfigurationError(error.to_string())
    }
}

impl From<StateMachineError> for PipelineError {
    fn from(error: StateMachineError) -> Self {
        PipelineError::StateTransition(error.to_string())
    }
}

/// Failure reported by a delegated call (query engine, storage export, cluster API).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("External service error: {service} - {message}")]
pub struct ExternalServiceError {
    pub service: String,
    pub message: String,
}

impl ExternalServiceError {
    pub fn new(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
