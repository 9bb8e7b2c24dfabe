use std::sync::Arc;

use store_recs::constants::events;
use store_recs::constants::task_ids::*;
use store_recs::config::NotificationConfig;
use store_recs::orchestration::NotificationKind;
use store_recs::{ExecutionStatus, RunOutcome, TaskRunState};

use crate::common::*;

#[tokio::test]
async fn test_exhausted_write_leaves_downstream_pending() {
    let handler = Arc::new(ScriptedHandler::new().script(WRITE_TRAINING_TABLE, Script::AlwaysFail));
    let notifier = Arc::new(RecordingNotifier::new());
    let executor = executor_with(
        handler.clone(),
        notifier.clone(),
        fast_settings().with_max_attempts(3),
    );

    let report = executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert_eq!(report.execution_status, ExecutionStatus::BlockedByFailures);
    assert_eq!(report.state_of(WRITE_TRAINING_TABLE), Some(TaskRunState::Failed));
    assert_eq!(report.attempts_of(WRITE_TRAINING_TABLE), 3);
    assert_eq!(report.state_of(CREATE_CLUSTER), Some(TaskRunState::Success));

    for task_id in [EXPORT_TRAINING_TABLE, SUBMIT_TRAINING_JOB, DELETE_CLUSTER] {
        assert_eq!(report.state_of(task_id), Some(TaskRunState::Pending));
        assert_eq!(report.attempts_of(task_id), 0);
        assert_eq!(handler.attempts_of(task_id), 0, "{task_id} must never start");
    }

    let last_error = report.tasks[WRITE_TRAINING_TABLE].last_error.as_deref().unwrap();
    assert!(last_error.contains("attempt 3 failed"));
}

#[tokio::test]
async fn test_every_retry_and_the_final_failure_are_notified() {
    let handler = Arc::new(ScriptedHandler::new().script(WRITE_TRAINING_TABLE, Script::AlwaysFail));
    let notifier = Arc::new(RecordingNotifier::new());
    let executor = executor_with(handler, notifier.clone(), fast_settings().with_max_attempts(3));

    executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();

    assert_eq!(notifier.count(NotificationKind::Retry), 2);
    assert_eq!(notifier.count(NotificationKind::Failure), 1);

    let received = notifier.received();
    let attempts: Vec<u32> = received.iter().map(|n| n.attempt).collect();
    assert_eq!(attempts, vec![1, 2, 3]);
    assert!(received
        .iter()
        .all(|n| n.recipients == vec!["oncall@example.com".to_string()]));
    assert!(received[0].retry_in.is_some());
    assert!(received[2].retry_in.is_none());
}

#[tokio::test]
async fn test_transient_failure_recovers_within_budget() {
    let handler = Arc::new(ScriptedHandler::new().script(CREATE_CLUSTER, Script::FailTimes(2)));
    let notifier = Arc::new(RecordingNotifier::new());
    let executor = executor_with(handler.clone(), notifier.clone(), fast_settings());
    let mut receiver = executor.events().subscribe();

    let report = executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();
    let events = drain_events(&mut receiver);

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(report.attempts_of(CREATE_CLUSTER), 3);
    assert_eq!(notifier.count(NotificationKind::Retry), 2);
    assert_eq!(notifier.count(NotificationKind::Failure), 0);

    let retries = events
        .iter()
        .filter(|e| e.name == events::TASK_RETRY_SCHEDULED)
        .count();
    assert_eq!(retries, 2);

    let states: Vec<TaskRunState> = report.tasks[CREATE_CLUSTER]
        .transitions
        .iter()
        .map(|t| t.to_state)
        .collect();
    assert_eq!(
        states,
        vec![
            TaskRunState::Running,
            TaskRunState::Failed,
            TaskRunState::Pending,
            TaskRunState::Running,
            TaskRunState::Failed,
            TaskRunState::Pending,
            TaskRunState::Running,
            TaskRunState::Success,
        ]
    );
}

#[tokio::test]
async fn test_disabled_retry_notices_are_not_sent() {
    let handler = Arc::new(ScriptedHandler::new().script(WRITE_TRAINING_TABLE, Script::AlwaysFail));
    let notifier = Arc::new(RecordingNotifier::new());
    let settings = fast_settings()
        .with_max_attempts(2)
        .with_notifications(NotificationConfig {
            emails: vec!["oncall@example.com".to_string()],
            email_on_failure: true,
            email_on_retry: false,
        });
    let executor = executor_with(handler, notifier.clone(), settings);

    executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();

    assert_eq!(notifier.count(NotificationKind::Retry), 0);
    assert_eq!(notifier.count(NotificationKind::Failure), 1);
}

#[tokio::test]
async fn test_notifier_errors_do_not_fail_the_run() {
    let handler = Arc::new(ScriptedHandler::new().script(CREATE_CLUSTER, Script::FailTimes(1)));
    let notifier = Arc::new(RecordingNotifier::failing());
    let executor = executor_with(handler, notifier.clone(), fast_settings());

    let report = executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(notifier.received().len(), 1);
}

#[tokio::test]
async fn test_handler_panic_counts_as_failed_attempt() {
    let handler = Arc::new(ScriptedHandler::new().script(CREATE_CLUSTER, Script::Panic));
    let executor = executor_with(
        handler,
        Arc::new(RecordingNotifier::new()),
        fast_settings().with_max_attempts(2),
    );

    let report = executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();

    assert_eq!(report.state_of(CREATE_CLUSTER), Some(TaskRunState::Failed));
    assert_eq!(report.attempts_of(CREATE_CLUSTER), 2);
    assert!(report.tasks[CREATE_CLUSTER]
        .last_error
        .as_deref()
        .unwrap()
        .contains("panicked"));
    assert_eq!(report.state_of(SUBMIT_TRAINING_JOB), Some(TaskRunState::Pending));
    assert_eq!(report.state_of(WRITE_TRAINING_TABLE), Some(TaskRunState::Success));
}
