//! # Task Handlers
//!
//! The executor never talks to a warehouse or cluster API itself. Each task
//! kind is bound to a [`TaskHandler`] that performs the delegated call and
//! reports success or an [`ExternalServiceError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::dry_run::DryRunHandler;
use crate::error::{ExternalServiceError, PipelineError, Result};
use crate::models::{RunContext, TaskDefinition, TaskId, TaskKind};
use crate::pipeline::Pipeline;

/// Everything a handler needs for one attempt of one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInvocation {
    pub context: RunContext,
    pub task: TaskDefinition,
    /// 1-based attempt number
    pub attempt: u32,
    pub max_attempts: u32,
}

impl TaskInvocation {
    pub fn task_id(&self) -> &TaskId {
        &self.task.id
    }

    pub fn kind(&self) -> TaskKind {
        self.task.kind()
    }

    /// Payload as JSON with the run's logical date substituted
    pub fn rendered_parameters(&self) -> serde_json::Value {
        self.task
            .payload
            .rendered_parameters(self.context.logical_date)
    }

    pub fn is_final_attempt(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// Result of a successful attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub summary: String,
    pub data: serde_json::Value,
}

impl TaskOutput {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Performs the delegated work for one task kind
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn execute(
        &self,
        invocation: &TaskInvocation,
    ) -> std::result::Result<TaskOutput, ExternalServiceError>;
}

/// One handler per task kind
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&TaskKind> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("HandlerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry routing every kind to a shared [`DryRunHandler`]
    pub fn with_dry_run() -> (Self, Arc<DryRunHandler>) {
        let handler = Arc::new(DryRunHandler::new());
        let mut registry = Self::new();
        registry.register_all(handler.clone());
        (registry, handler)
    }

    /// Bind a handler to a kind, replacing any previous binding
    pub fn register(&mut self, kind: TaskKind, handler: Arc<dyn TaskHandler>) -> &mut Self {
        self.handlers.insert(kind, handler);
        self
    }

    /// Bind one handler to every kind
    pub fn register_all(&mut self, handler: Arc<dyn TaskHandler>) -> &mut Self {
        for kind in TaskKind::ALL {
            self.handlers.insert(kind, handler.clone());
        }
        self
    }

    pub fn get(&self, kind: TaskKind) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn contains(&self, kind: TaskKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Fail before a run starts if any task of the pipeline has no handler
    pub fn ensure_covers(&self, pipeline: &Pipeline) -> Result<()> {
        match pipeline.tasks().find(|task| !self.contains(task.kind())) {
            Some(task) => Err(PipelineError::HandlerNotRegistered {
                kind: task.kind().to_string(),
            }),
            None => Ok(()),
        }
    }
}
