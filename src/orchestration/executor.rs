//! # Pipeline Executor
//!
//! Drives one run of an immutable [`Pipeline`] to completion.
//!
//! ## Execution model
//!
//! - The control loop owns every task state machine of the run; handlers only
//!   ever see a [`TaskInvocation`] and report back through a `JoinSet`, so state
//!   transitions are serialized without locks.
//! - A task starts the moment it is `Pending` and all its upstream tasks have
//!   succeeded, up to `max_concurrency` attempts in flight.
//! - A failed attempt moves the task to `Failed`. While the retry budget lasts
//!   a retry notice goes out and a timer returns the task to `Pending` after the
//!   fixed delay. Once the budget is spent a failure notice goes out and the
//!   task stays `Failed`; its downstream tasks never start.
//! - Cancellation stops new starts, drops in-flight attempts (`Cancelled`) and
//!   abandons pending retries. Nothing is compensated.
//! - With `guaranteed_teardown`, teardown tasks whose guarded resource was
//!   created but which never ran are executed after the graph settles.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use store_recs::config::PipelineConfig;
//! use store_recs::orchestration::{
//!     CancellationHandle, ExecutorSettings, HandlerRegistry, PipelineExecutor,
//! };
//! use store_recs::pipeline::define_pipeline;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::default();
//! let pipeline = Arc::new(define_pipeline(&config)?);
//! let (handlers, _) = HandlerRegistry::with_dry_run();
//!
//! let executor =
//!     PipelineExecutor::new(pipeline, handlers, ExecutorSettings::from_config(&config))?;
//! let date = chrono::NaiveDate::from_ymd_opt(2017, 12, 4).unwrap();
//! let report = executor.execute(date, CancellationHandle::new()).await?;
//! println!("{}", report.outcome);
//! # Ok(())
//! # }
//! ```

use chrono::{NaiveDate, Utc};
use futures::FutureExt;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, instrument, warn};

use super::cancellation::CancellationHandle;
use super::handler::{HandlerRegistry, TaskHandler, TaskInvocation, TaskOutput};
use super::notifier::{LoggingNotifier, Notification, NotificationKind, Notifier};
use super::readiness::ReadinessEvaluator;
use crate::config::{NotificationConfig, PipelineConfig, PipelineSettings};
use crate::constants::events;
use crate::error::{PipelineError, Result};
use crate::events::EventPublisher;
use crate::logging::{log_error, log_run_operation, log_task_operation};
use crate::models::{RunContext, RunOutcome, RunReport, TaskId, TaskRunSummary};
use crate::pipeline::Pipeline;
use crate::state_machine::{TaskRunEvent, TaskRunState, TaskStateMachine};

/// Knobs for one executor
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorSettings {
    pub max_concurrency: usize,
    /// Total attempts per task, including the first
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub guaranteed_teardown: bool,
    pub notifications: NotificationConfig,
}

impl ExecutorSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_concurrency: config.pipeline.max_active_tasks.max(1),
            max_attempts: config.retry.max_attempts(),
            retry_delay: config.retry.retry_delay(),
            guaranteed_teardown: config.pipeline.guaranteed_teardown,
            notifications: config.notifications.clone(),
        }
    }

    /// Settings taken from the pipeline's task defaults
    pub fn for_pipeline(pipeline: &Pipeline) -> Self {
        let defaults = pipeline.defaults();
        let settings = PipelineSettings::default();
        Self {
            max_concurrency: settings.max_active_tasks,
            max_attempts: defaults.retry.max_attempts(),
            retry_delay: defaults.retry.retry_delay(),
            guaranteed_teardown: settings.guaranteed_teardown,
            notifications: defaults.notifications.clone(),
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_guaranteed_teardown(mut self, enabled: bool) -> Self {
        self.guaranteed_teardown = enabled;
        self
    }

    pub fn with_notifications(mut self, notifications: NotificationConfig) -> Self {
        self.notifications = notifications;
        self
    }
}

enum AttemptResult {
    Succeeded(TaskOutput),
    Failed(String),
    Cancelled,
}

enum Completion {
    Attempt {
        task_id: TaskId,
        attempt: u32,
        result: AttemptResult,
    },
    RetryDue {
        task_id: TaskId,
    },
    RetryAbandoned {
        task_id: TaskId,
    },
}

/// Mutable record of one run, owned by the control loop
struct RunState {
    context: RunContext,
    machines: BTreeMap<TaskId, TaskStateMachine>,
    outputs: BTreeMap<TaskId, Value>,
    awaiting_retry: BTreeSet<TaskId>,
    /// Spawned attempts by tokio task id, to recover a task whose future was lost
    attempts_in_flight: HashMap<tokio::task::Id, (TaskId, u32)>,
    cancel_observed: bool,
}

impl RunState {
    fn new(context: RunContext, pipeline: &Pipeline) -> Self {
        let machines = pipeline
            .task_ids()
            .map(|id| (id.clone(), TaskStateMachine::new(id.clone())))
            .collect();
        Self {
            context,
            machines,
            outputs: BTreeMap::new(),
            awaiting_retry: BTreeSet::new(),
            attempts_in_flight: HashMap::new(),
            cancel_observed: false,
        }
    }

    fn states(&self) -> BTreeMap<TaskId, TaskRunState> {
        self.machines
            .iter()
            .map(|(id, machine)| (id.clone(), machine.current_state()))
            .collect()
    }

    fn state_of(&self, task_id: &TaskId) -> TaskRunState {
        self.machines
            .get(task_id)
            .map(TaskStateMachine::current_state)
            .unwrap_or_default()
    }

    fn running(&self) -> usize {
        self.machines
            .values()
            .filter(|machine| machine.current_state().is_active())
            .count()
    }

    fn machine(&self, task_id: &TaskId) -> Result<&TaskStateMachine> {
        self.machines
            .get(task_id)
            .ok_or_else(|| PipelineError::UnknownTask {
                task_id: task_id.to_string(),
            })
    }

    fn machine_mut(&mut self, task_id: &TaskId) -> Result<&mut TaskStateMachine> {
        self.machines
            .get_mut(task_id)
            .ok_or_else(|| PipelineError::UnknownTask {
                task_id: task_id.to_string(),
            })
    }

    fn run_event(&self) -> Value {
        json!({
            "dag_id": self.context.dag_id,
            "run_id": self.context.run_id.to_string(),
            "logical_date": self.context.ds(),
        })
    }

    fn task_event(&self, task_id: &TaskId, attempt: u32) -> Value {
        json!({
            "dag_id": self.context.dag_id,
            "run_id": self.context.run_id.to_string(),
            "logical_date": self.context.ds(),
            "task_id": task_id.as_str(),
            "attempt": attempt,
        })
    }
}

fn with_field(mut value: Value, key: &str, field: Value) -> Value {
    if let Some(object) = value.as_object_mut() {
        object.insert(key.to_string(), field);
    }
    value
}

/// Run one attempt, turning a handler panic into an ordinary failure
async fn run_attempt(handler: &dyn TaskHandler, invocation: &TaskInvocation) -> AttemptResult {
    // `execute` itself may panic before handing back a future
    match AssertUnwindSafe(async { handler.execute(invocation).await })
        .catch_unwind()
        .await
    {
        Ok(Ok(output)) => AttemptResult::Succeeded(output),
        Ok(Err(error)) => AttemptResult::Failed(error.to_string()),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            AttemptResult::Failed(format!("handler panicked: {message}"))
        }
    }
}

/// Executes runs of one pipeline
pub struct PipelineExecutor {
    pipeline: Arc<Pipeline>,
    handlers: HandlerRegistry,
    notifier: Arc<dyn Notifier>,
    events: EventPublisher,
    settings: ExecutorSettings,
}

impl std::fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("dag_id", &self.pipeline.dag_id())
            .field("handlers", &self.handlers)
            .field("settings", &self.settings)
            .finish()
    }
}

impl PipelineExecutor {
    /// Fails if any task kind of the pipeline has no handler
    pub fn new(
        pipeline: Arc<Pipeline>,
        handlers: HandlerRegistry,
        settings: ExecutorSettings,
    ) -> Result<Self> {
        handlers.ensure_covers(&pipeline)?;
        Ok(Self {
            pipeline,
            handlers,
            notifier: Arc::new(LoggingNotifier),
            events: EventPublisher::default(),
            settings,
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_event_publisher(mut self, events: EventPublisher) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventPublisher {
        &self.events
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Execute a fresh run for `logical_date`
    pub async fn execute(
        &self,
        logical_date: NaiveDate,
        cancel: CancellationHandle,
    ) -> Result<RunReport> {
        let context = RunContext::new(self.pipeline.dag_id(), logical_date);
        self.execute_run(context, cancel).await
    }

    /// Execute a run with a caller-supplied context
    #[instrument(skip(self, context, cancel), fields(
        dag_id = %context.dag_id,
        run_id = %context.run_id,
        logical_date = %context.logical_date
    ))]
    pub async fn execute_run(
        &self,
        context: RunContext,
        cancel: CancellationHandle,
    ) -> Result<RunReport> {
        let mut run = RunState::new(context, &self.pipeline);
        let mut in_flight: JoinSet<Completion> = JoinSet::new();

        log_run_operation(
            "start",
            &run.context.dag_id,
            &run.context.run_id.to_string(),
            &run.context.ds(),
            "running",
            None,
        );
        self.publish(events::RUN_STARTED, run.run_event()).await;

        loop {
            self.observe_cancellation(&mut run, &cancel).await;

            if !run.cancel_observed {
                self.launch_ready_tasks(&mut run, &mut in_flight, &cancel)
                    .await?;
            }

            let Some(joined) = in_flight.join_next_with_id().await else {
                break;
            };
            self.process_joined(&mut run, &mut in_flight, &cancel, joined)
                .await?;
        }

        self.observe_cancellation(&mut run, &cancel).await;

        if self.settings.guaranteed_teardown {
            self.run_forced_teardowns(&mut run).await?;
        }

        let report = self.build_report(run);

        log_run_operation(
            "finish",
            &report.context.dag_id,
            &report.context.run_id.to_string(),
            &report.context.ds(),
            &report.outcome.to_string(),
            Some(&report.execution_status.to_string()),
        );
        self.publish(
            events::RUN_FINISHED,
            json!({
                "dag_id": report.context.dag_id,
                "run_id": report.context.run_id.to_string(),
                "logical_date": report.context.ds(),
                "outcome": report.outcome,
                "execution_status": report.execution_status,
            }),
        )
        .await;

        Ok(report)
    }

    async fn observe_cancellation(&self, run: &mut RunState, cancel: &CancellationHandle) {
        if run.cancel_observed || !cancel.is_cancelled() {
            return;
        }
        run.cancel_observed = true;
        info!(
            running = run.running(),
            awaiting_retry = run.awaiting_retry.len(),
            "Run cancellation requested - no further tasks will start"
        );
        self.publish(events::RUN_CANCEL_REQUESTED, run.run_event())
            .await;
    }

    async fn launch_ready_tasks(
        &self,
        run: &mut RunState,
        in_flight: &mut JoinSet<Completion>,
        cancel: &CancellationHandle,
    ) -> Result<()> {
        let slots = self.settings.max_concurrency.saturating_sub(run.running());
        if slots == 0 {
            return Ok(());
        }

        let ready = ReadinessEvaluator::new(&self.pipeline).ready_tasks(&run.states());
        if ready.len() > slots {
            debug!(
                ready = ready.len(),
                slots = slots,
                "Concurrency limit reached - deferring ready tasks"
            );
        }

        for task_id in ready.into_iter().take(slots) {
            if cancel.is_cancelled() {
                debug!(task_id = %task_id, "Cancelled while launching - leaving task pending");
                break;
            }
            let (invocation, handler) = self.begin_attempt(run, &task_id).await?;
            let cancel = cancel.clone();
            let attempt = invocation.attempt;
            let tracked = task_id.clone();
            let spawned = in_flight.spawn(async move {
                let result = tokio::select! {
                    _ = cancel.cancelled() => AttemptResult::Cancelled,
                    result = run_attempt(handler.as_ref(), &invocation) => result,
                };
                Completion::Attempt {
                    task_id,
                    attempt,
                    result,
                }
            });
            run.attempts_in_flight
                .insert(spawned.id(), (tracked, attempt));
        }

        Ok(())
    }

    /// Route a joined future; an attempt whose future died counts as a failed attempt
    async fn process_joined(
        &self,
        run: &mut RunState,
        in_flight: &mut JoinSet<Completion>,
        cancel: &CancellationHandle,
        joined: std::result::Result<(tokio::task::Id, Completion), JoinError>,
    ) -> Result<()> {
        match joined {
            Ok((id, completion)) => {
                run.attempts_in_flight.remove(&id);
                self.handle_completion(run, in_flight, cancel, completion)
                    .await
            }
            Err(join_error) => {
                let Some((task_id, attempt)) = run.attempts_in_flight.remove(&join_error.id())
                else {
                    error!(error = %join_error, "Retry timer terminated abnormally");
                    return Ok(());
                };
                error!(
                    task_id = %task_id,
                    attempt = attempt,
                    error = %join_error,
                    "Task attempt terminated abnormally"
                );
                let completion = Completion::Attempt {
                    task_id,
                    attempt,
                    result: AttemptResult::Failed(format!(
                        "attempt terminated abnormally: {join_error}"
                    )),
                };
                self.handle_completion(run, in_flight, cancel, completion)
                    .await
            }
        }
    }

    /// Move a task to `Running` and build its invocation
    async fn begin_attempt(
        &self,
        run: &mut RunState,
        task_id: &TaskId,
    ) -> Result<(TaskInvocation, Arc<dyn TaskHandler>)> {
        let task = self
            .pipeline
            .task(task_id.as_str())
            .ok_or_else(|| PipelineError::UnknownTask {
                task_id: task_id.to_string(),
            })?
            .clone();
        let handler =
            self.handlers
                .get(task.kind())
                .ok_or_else(|| PipelineError::HandlerNotRegistered {
                    kind: task.kind().to_string(),
                })?;

        let machine = run.machine_mut(task_id)?;
        machine.transition(TaskRunEvent::Start)?;
        let attempt = machine.attempts();

        log_task_operation(
            "start",
            &run.context.dag_id,
            task_id.as_str(),
            &run.context.ds(),
            "running",
            Some(&format!("attempt {attempt}/{}", self.settings.max_attempts)),
        );
        self.publish(events::TASK_STARTED, run.task_event(task_id, attempt))
            .await;

        let invocation = TaskInvocation {
            context: run.context.clone(),
            task,
            attempt,
            max_attempts: self.settings.max_attempts,
        };
        Ok((invocation, handler))
    }

    async fn handle_completion(
        &self,
        run: &mut RunState,
        in_flight: &mut JoinSet<Completion>,
        cancel: &CancellationHandle,
        completion: Completion,
    ) -> Result<()> {
        match completion {
            Completion::Attempt {
                task_id,
                attempt,
                result,
            } => match result {
                AttemptResult::Succeeded(output) => {
                    self.record_success(run, &task_id, attempt, output).await?;
                }
                AttemptResult::Failed(message) => {
                    let may_retry = !run.cancel_observed && !cancel.is_cancelled();
                    if self
                        .record_failure(run, &task_id, attempt, &message, may_retry)
                        .await?
                    {
                        run.awaiting_retry.insert(task_id.clone());
                        let delay = self.settings.retry_delay;
                        let cancel = cancel.clone();
                        in_flight.spawn(async move {
                            tokio::select! {
                                _ = cancel.cancelled() => Completion::RetryAbandoned { task_id },
                                _ = tokio::time::sleep(delay) => Completion::RetryDue { task_id },
                            }
                        });
                    }
                }
                AttemptResult::Cancelled => {
                    run.machine_mut(&task_id)?.transition(TaskRunEvent::Cancel)?;
                    log_task_operation(
                        "cancel",
                        &run.context.dag_id,
                        task_id.as_str(),
                        &run.context.ds(),
                        "cancelled",
                        None,
                    );
                    self.publish(events::TASK_CANCELLED, run.task_event(&task_id, attempt))
                        .await;
                }
            },
            Completion::RetryDue { task_id } => {
                run.awaiting_retry.remove(&task_id);
                if run.cancel_observed || cancel.is_cancelled() {
                    info!(task_id = %task_id, "Retry abandoned after cancellation");
                    return Ok(());
                }
                self.return_to_pending(run, &task_id).await?;
            }
            Completion::RetryAbandoned { task_id } => {
                run.awaiting_retry.remove(&task_id);
                info!(task_id = %task_id, "Retry abandoned after cancellation");
            }
        }
        Ok(())
    }

    async fn record_success(
        &self,
        run: &mut RunState,
        task_id: &TaskId,
        attempt: u32,
        output: TaskOutput,
    ) -> Result<()> {
        run.machine_mut(task_id)?.transition(TaskRunEvent::Succeed)?;

        log_task_operation(
            "complete",
            &run.context.dag_id,
            task_id.as_str(),
            &run.context.ds(),
            "success",
            Some(&output.summary),
        );
        self.publish(
            events::TASK_SUCCEEDED,
            with_field(
                run.task_event(task_id, attempt),
                "summary",
                json!(output.summary),
            ),
        )
        .await;

        run.outputs.insert(
            task_id.clone(),
            json!({ "summary": output.summary, "data": output.data }),
        );
        Ok(())
    }

    /// Record a failed attempt and notify; returns whether a retry should follow
    async fn record_failure(
        &self,
        run: &mut RunState,
        task_id: &TaskId,
        attempt: u32,
        message: &str,
        may_retry: bool,
    ) -> Result<bool> {
        run.machine_mut(task_id)?
            .transition(TaskRunEvent::fail_with_error(message))?;

        warn!(
            task_id = %task_id,
            attempt = attempt,
            max_attempts = self.settings.max_attempts,
            error = %message,
            "Task attempt failed"
        );
        self.publish(
            events::TASK_FAILED,
            with_field(run.task_event(task_id, attempt), "error", json!(message)),
        )
        .await;

        let budget_left = attempt < self.settings.max_attempts;
        if budget_left && may_retry {
            self.notify(run, NotificationKind::Retry, task_id, attempt, message)
                .await;
            self.publish(
                events::TASK_RETRY_SCHEDULED,
                with_field(
                    run.task_event(task_id, attempt),
                    "retry_delay_ms",
                    json!(self.settings.retry_delay.as_millis() as u64),
                ),
            )
            .await;
            return Ok(true);
        }

        if !budget_left {
            log_error(
                "executor",
                "retries_exhausted",
                message,
                Some(task_id.as_str()),
            );
            self.notify(run, NotificationKind::Failure, task_id, attempt, message)
                .await;
        }
        Ok(false)
    }

    async fn return_to_pending(&self, run: &mut RunState, task_id: &TaskId) -> Result<()> {
        let machine = run.machine_mut(task_id)?;
        machine.transition(TaskRunEvent::Retry)?;
        let attempt = machine.attempts();
        debug!(task_id = %task_id, next_attempt = attempt + 1, "Retry delay elapsed");
        self.publish(events::TASK_RETRY_DUE, run.task_event(task_id, attempt))
            .await;
        Ok(())
    }

    async fn notify(
        &self,
        run: &RunState,
        kind: NotificationKind,
        task_id: &TaskId,
        attempt: u32,
        error: &str,
    ) {
        let enabled = match kind {
            NotificationKind::Retry => self.settings.notifications.email_on_retry,
            NotificationKind::Failure => self.settings.notifications.email_on_failure,
        };
        if !enabled {
            return;
        }

        let notification = Notification {
            kind,
            dag_id: run.context.dag_id.clone(),
            run_id: run.context.run_id,
            logical_date: run.context.logical_date,
            task_id: task_id.clone(),
            attempt,
            max_attempts: self.settings.max_attempts,
            error: error.to_string(),
            retry_in: (kind == NotificationKind::Retry).then_some(self.settings.retry_delay),
            recipients: self.settings.notifications.emails.clone(),
        };

        if let Err(e) = self.notifier.notify(&notification).await {
            log_error(
                "notifier",
                &format!("notify_{kind}"),
                &e.to_string(),
                Some(task_id.as_str()),
            );
        }
    }

    /// Run teardowns whose resource task succeeded but which never started
    async fn run_forced_teardowns(&self, run: &mut RunState) -> Result<()> {
        for teardown in self.pipeline.teardowns() {
            let resource_created = run.state_of(&teardown.resource) == TaskRunState::Success;
            let never_ran = run.machine(&teardown.task)?.attempts() == 0;
            if !(resource_created && never_ran) {
                continue;
            }

            warn!(
                task_id = %teardown.task,
                resource = %teardown.resource,
                "Graph settled without teardown - running it as a finally-step"
            );
            self.publish(
                events::TASK_TEARDOWN_FORCED,
                with_field(
                    run.task_event(&teardown.task, 0),
                    "resource",
                    json!(teardown.resource.as_str()),
                ),
            )
            .await;

            self.run_teardown(run, &teardown.task).await?;
        }
        Ok(())
    }

    /// Inline attempt loop for a forced teardown; ignores cancellation
    async fn run_teardown(&self, run: &mut RunState, task_id: &TaskId) -> Result<()> {
        loop {
            let (invocation, handler) = self.begin_attempt(run, task_id).await?;
            let attempt = invocation.attempt;

            match run_attempt(handler.as_ref(), &invocation).await {
                AttemptResult::Succeeded(output) => {
                    return self.record_success(run, task_id, attempt, output).await;
                }
                AttemptResult::Failed(message) => {
                    if !self
                        .record_failure(run, task_id, attempt, &message, true)
                        .await?
                    {
                        return Ok(());
                    }
                    tokio::time::sleep(self.settings.retry_delay).await;
                    self.return_to_pending(run, task_id).await?;
                }
                AttemptResult::Cancelled => {
                    run.machine_mut(task_id)?.transition(TaskRunEvent::Cancel)?;
                    return Ok(());
                }
            }
        }
    }

    fn build_report(&self, mut run: RunState) -> RunReport {
        let states = run.states();
        let execution_status =
            ReadinessEvaluator::new(&self.pipeline).execution_status(&states, &run.awaiting_retry);

        let outcome = if states.values().all(|s| *s == TaskRunState::Success) {
            RunOutcome::Succeeded
        } else if run.cancel_observed {
            RunOutcome::Cancelled
        } else {
            RunOutcome::Failed
        };

        let tasks = run
            .machines
            .iter()
            .map(|(id, machine)| {
                (
                    id.clone(),
                    TaskRunSummary {
                        state: machine.current_state(),
                        attempts: machine.attempts(),
                        last_error: machine.last_error().map(str::to_string),
                        output: run.outputs.remove(id),
                        transitions: machine.transitions().to_vec(),
                    },
                )
            })
            .collect();

        RunReport {
            context: run.context,
            outcome,
            execution_status,
            tasks,
            finished_at: Utc::now(),
        }
    }

    async fn publish(&self, name: &str, context: Value) {
        if let Err(e) = self.events.publish(name, context).await {
            debug!(event = name, error = %e, "Failed to publish lifecycle event");
        }
    }
}
