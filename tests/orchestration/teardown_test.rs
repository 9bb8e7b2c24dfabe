use std::sync::Arc;
use std::time::Duration;

use store_recs::constants::events;
use store_recs::constants::task_ids::*;
use store_recs::orchestration::CancellationHandle;
use store_recs::{RunOutcome, TaskRunState};

use crate::common::*;

#[tokio::test]
async fn test_failed_job_leaves_cluster_running_by_default() {
    let handler = Arc::new(ScriptedHandler::new().script(SUBMIT_TRAINING_JOB, Script::AlwaysFail));
    let executor = executor_with(
        handler.clone(),
        Arc::new(RecordingNotifier::new()),
        fast_settings().with_max_attempts(1),
    );

    let report = executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert_eq!(report.state_of(DELETE_CLUSTER), Some(TaskRunState::Pending));
    assert_eq!(handler.attempts_of(DELETE_CLUSTER), 0);
}

#[tokio::test]
async fn test_guaranteed_teardown_deletes_cluster_after_job_failure() {
    let handler = Arc::new(ScriptedHandler::new().script(SUBMIT_TRAINING_JOB, Script::AlwaysFail));
    let executor = executor_with(
        handler.clone(),
        Arc::new(RecordingNotifier::new()),
        fast_settings()
            .with_max_attempts(2)
            .with_guaranteed_teardown(true),
    );
    let mut receiver = executor.events().subscribe();

    let report = executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();
    let events = drain_events(&mut receiver);

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert_eq!(report.state_of(SUBMIT_TRAINING_JOB), Some(TaskRunState::Failed));
    assert_eq!(report.state_of(DELETE_CLUSTER), Some(TaskRunState::Success));
    assert_eq!(handler.attempts_of(DELETE_CLUSTER), 1);

    let forced = event_index(&events, events::TASK_TEARDOWN_FORCED, DELETE_CLUSTER).unwrap();
    let started = event_index(&events, events::TASK_STARTED, DELETE_CLUSTER).unwrap();
    assert!(forced < started);
}

#[tokio::test]
async fn test_guaranteed_teardown_retries_within_budget() {
    let handler = Arc::new(
        ScriptedHandler::new()
            .script(SUBMIT_TRAINING_JOB, Script::AlwaysFail)
            .script(DELETE_CLUSTER, Script::FailTimes(1)),
    );
    let notifier = Arc::new(RecordingNotifier::new());
    let executor = executor_with(
        handler.clone(),
        notifier.clone(),
        fast_settings()
            .with_max_attempts(2)
            .with_guaranteed_teardown(true),
    );

    let report = executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();

    assert_eq!(report.state_of(DELETE_CLUSTER), Some(TaskRunState::Success));
    assert_eq!(report.attempts_of(DELETE_CLUSTER), 2);
}

#[tokio::test]
async fn test_guaranteed_teardown_runs_after_cancellation() {
    let handler = Arc::new(ScriptedHandler::new().script(SUBMIT_TRAINING_JOB, Script::Hang));
    let executor = Arc::new(executor_with(
        handler.clone(),
        Arc::new(RecordingNotifier::new()),
        fast_settings().with_guaranteed_teardown(true),
    ));
    let mut receiver = executor.events().subscribe();
    let cancel = CancellationHandle::new();

    let run = {
        let executor = executor.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { executor.execute(logical_date(), cancel).await })
    };

    wait_for_event(&mut receiver, events::TASK_STARTED, SUBMIT_TRAINING_JOB).await;
    cancel.cancel();

    let report = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("cancelled run did not settle")
        .unwrap()
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert_eq!(report.state_of(SUBMIT_TRAINING_JOB), Some(TaskRunState::Cancelled));
    assert_eq!(report.state_of(DELETE_CLUSTER), Some(TaskRunState::Success));
}

#[tokio::test]
async fn test_no_teardown_when_cluster_was_never_created() {
    let handler = Arc::new(ScriptedHandler::new().script(CREATE_CLUSTER, Script::AlwaysFail));
    let executor = executor_with(
        handler.clone(),
        Arc::new(RecordingNotifier::new()),
        fast_settings()
            .with_max_attempts(1)
            .with_guaranteed_teardown(true),
    );

    let report = executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();

    assert_eq!(report.state_of(CREATE_CLUSTER), Some(TaskRunState::Failed));
    assert_eq!(report.state_of(DELETE_CLUSTER), Some(TaskRunState::Pending));
    assert_eq!(handler.attempts_of(DELETE_CLUSTER), 0);
}
