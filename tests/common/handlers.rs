//! Scripted collaborators for executor tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Barrier};

use store_recs::config::PipelineConfig;
use store_recs::events::PublishedEvent;
use store_recs::orchestration::{
    ExecutorSettings, HandlerRegistry, Notification, NotificationError, NotificationKind,
    Notifier, PipelineExecutor, TaskHandler, TaskInvocation, TaskOutput,
};
use store_recs::pipeline::{define_pipeline, Pipeline};
use store_recs::ExternalServiceError;

/// How a scripted task behaves
#[derive(Debug, Clone)]
pub enum Script {
    Succeed,
    /// Fail the first `n` attempts, then succeed
    FailTimes(u32),
    AlwaysFail,
    Panic,
    /// Never completes
    Hang,
    /// Wait until every participant reached the barrier
    Rendezvous(Arc<Barrier>),
}

/// Handler whose behaviour is scripted per task id
#[derive(Debug, Default)]
pub struct ScriptedHandler {
    scripts: HashMap<String, Script>,
    delay: Duration,
    calls: Mutex<Vec<(String, u32)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, task_id: &str, script: Script) -> Self {
        self.scripts.insert(task_id.to_string(), script);
        self
    }

    /// Time every attempt takes before its scripted outcome
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// `(task_id, attempt)` in start order
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().clone()
    }

    pub fn attempts_of(&self, task_id: &str) -> usize {
        self.calls.lock().iter().filter(|(id, _)| id == task_id).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn perform(
        &self,
        invocation: &TaskInvocation,
    ) -> Result<TaskOutput, ExternalServiceError> {
        let task_id = invocation.task_id().to_string();
        let failure = || {
            ExternalServiceError::new(
                invocation.kind().service(),
                format!("{task_id} attempt {} failed", invocation.attempt),
            )
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.scripts.get(&task_id).cloned().unwrap_or(Script::Succeed) {
            Script::Succeed => Ok(TaskOutput::new(format!("{task_id} done"))),
            Script::FailTimes(n) if invocation.attempt <= n => Err(failure()),
            Script::FailTimes(_) => Ok(TaskOutput::new(format!("{task_id} done"))),
            Script::AlwaysFail => Err(failure()),
            Script::Panic => panic!("{task_id} exploded"),
            Script::Hang => {
                std::future::pending::<()>().await;
                Err(failure())
            }
            Script::Rendezvous(barrier) => {
                barrier.wait().await;
                Ok(TaskOutput::new(format!("{task_id} met its peer")))
            }
        }
    }
}

#[async_trait]
impl TaskHandler for ScriptedHandler {
    async fn execute(
        &self,
        invocation: &TaskInvocation,
    ) -> Result<TaskOutput, ExternalServiceError> {
        self.calls
            .lock()
            .push((invocation.task_id().to_string(), invocation.attempt));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let result = self.perform(invocation).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Notifier that keeps every notification, optionally failing delivery
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
    fail_delivery: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_delivery: true,
            ..Self::default()
        }
    }

    pub fn received(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.received.lock().iter().filter(|n| n.kind == kind).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.received.lock().push(notification.clone());
        if self.fail_delivery {
            return Err(NotificationError::Delivery("smtp unavailable".to_string()));
        }
        Ok(())
    }
}

pub fn logical_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 12, 4).unwrap()
}

pub fn training_pipeline() -> Arc<Pipeline> {
    Arc::new(define_pipeline(&PipelineConfig::default()).unwrap())
}

/// Settings with the production retry shape but test-sized delays
pub fn fast_settings() -> ExecutorSettings {
    let mut config = PipelineConfig::default();
    config.notifications.emails = vec!["oncall@example.com".to_string()];
    ExecutorSettings::from_config(&config).with_retry_delay(Duration::from_millis(10))
}

pub fn executor_with(
    handler: Arc<ScriptedHandler>,
    notifier: Arc<RecordingNotifier>,
    settings: ExecutorSettings,
) -> PipelineExecutor {
    let mut registry = HandlerRegistry::new();
    registry.register_all(handler);
    PipelineExecutor::new(training_pipeline(), registry, settings)
        .unwrap()
        .with_notifier(notifier)
}

/// Drain everything already published on a subscription
pub fn drain_events(receiver: &mut broadcast::Receiver<PublishedEvent>) -> Vec<PublishedEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

/// Index of the first event with `name` for `task_id`
pub fn event_index(events: &[PublishedEvent], name: &str, task_id: &str) -> Option<usize> {
    events
        .iter()
        .position(|e| e.name == name && e.task_id() == Some(task_id))
}

/// Wait until an event with `name` for `task_id` is published
pub async fn wait_for_event(
    receiver: &mut broadcast::Receiver<PublishedEvent>,
    name: &str,
    task_id: &str,
) -> PublishedEvent {
    loop {
        let event = receiver.recv().await.unwrap();
        if event.name == name && event.task_id() == Some(task_id) {
            return event;
        }
    }
}
