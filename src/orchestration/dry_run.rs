//! Handler that logs what would be sent to each external service and succeeds.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::handler::{TaskHandler, TaskInvocation, TaskOutput};
use crate::error::ExternalServiceError;
use crate::models::{TaskId, TaskKind};

/// One invocation seen by a [`DryRunHandler`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedInvocation {
    pub task_id: TaskId,
    pub kind: TaskKind,
    pub logical_date: NaiveDate,
    pub attempt: u32,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct DryRunHandler {
    invocations: Mutex<Vec<RecordedInvocation>>,
}

impl DryRunHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocations in the order they started
    pub fn invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.lock().clone()
    }
}

#[async_trait]
impl TaskHandler for DryRunHandler {
    async fn execute(
        &self,
        invocation: &TaskInvocation,
    ) -> Result<TaskOutput, ExternalServiceError> {
        let kind = invocation.kind();
        let parameters = invocation.rendered_parameters();

        info!(
            task_id = %invocation.task_id(),
            kind = %kind,
            service = kind.service(),
            logical_date = %invocation.context.logical_date,
            attempt = invocation.attempt,
            parameters = %parameters,
            "Dry run: skipping external call"
        );

        self.invocations.lock().push(RecordedInvocation {
            task_id: invocation.task_id().clone(),
            kind,
            logical_date: invocation.context.logical_date,
            attempt: invocation.attempt,
            parameters: parameters.clone(),
        });

        Ok(TaskOutput::new(format!("dry run of {kind} via {}", kind.service())).with_data(parameters))
    }
}
