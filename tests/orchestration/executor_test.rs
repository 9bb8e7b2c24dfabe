use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

use store_recs::constants::events;
use store_recs::constants::task_ids::*;
use store_recs::{ExecutionStatus, RunOutcome, TaskRunState};

use crate::common::*;

#[tokio::test]
async fn test_full_run_respects_every_edge() {
    let handler = Arc::new(ScriptedHandler::new().with_delay(Duration::from_millis(5)));
    let executor = executor_with(handler.clone(), Arc::new(RecordingNotifier::new()), fast_settings());
    let mut receiver = executor.events().subscribe();

    let report = executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();
    let events = drain_events(&mut receiver);

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(report.execution_status, ExecutionStatus::AllComplete);
    for task_id in ALL {
        assert_eq!(report.state_of(task_id), Some(TaskRunState::Success));
        assert_eq!(report.attempts_of(task_id), 1);
    }

    let pipeline = executor.pipeline();
    for (upstream, downstream) in pipeline.edges() {
        let done = event_index(&events, events::TASK_SUCCEEDED, upstream.as_str()).unwrap();
        let started = event_index(&events, events::TASK_STARTED, downstream.as_str()).unwrap();
        assert!(done < started, "{downstream} started before {upstream} succeeded");
    }

    assert_eq!(events.first().map(|e| e.name.as_str()), Some(events::RUN_STARTED));
    assert_eq!(events.last().map(|e| e.name.as_str()), Some(events::RUN_FINISHED));
    assert_eq!(handler.calls().len(), 5);
}

#[tokio::test]
async fn test_delete_cluster_waits_for_training_job_success() {
    let handler = Arc::new(
        ScriptedHandler::new()
            .script(SUBMIT_TRAINING_JOB, Script::FailTimes(2))
            .with_delay(Duration::from_millis(2)),
    );
    let executor = executor_with(handler.clone(), Arc::new(RecordingNotifier::new()), fast_settings());
    let mut receiver = executor.events().subscribe();

    let report = executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();
    let events = drain_events(&mut receiver);

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(report.attempts_of(SUBMIT_TRAINING_JOB), 3);

    let submit_succeeded =
        event_index(&events, events::TASK_SUCCEEDED, SUBMIT_TRAINING_JOB).unwrap();
    let delete_started = event_index(&events, events::TASK_STARTED, DELETE_CLUSTER).unwrap();
    assert!(submit_succeeded < delete_started);

    let calls = handler.calls();
    let delete_position = calls.iter().position(|(id, _)| id == DELETE_CLUSTER).unwrap();
    let last_submit = calls
        .iter()
        .rposition(|(id, _)| id == SUBMIT_TRAINING_JOB)
        .unwrap();
    assert!(last_submit < delete_position);
}

#[tokio::test]
async fn test_independent_roots_run_simultaneously() {
    let barrier = Arc::new(Barrier::new(2));
    let handler = Arc::new(
        ScriptedHandler::new()
            .script(WRITE_TRAINING_TABLE, Script::Rendezvous(barrier.clone()))
            .script(CREATE_CLUSTER, Script::Rendezvous(barrier)),
    );
    let executor = executor_with(handler.clone(), Arc::new(RecordingNotifier::new()), fast_settings());

    // Each root only finishes once the other is running too
    let report = tokio::time::timeout(
        Duration::from_secs(5),
        executor.execute(logical_date(), Default::default()),
    )
    .await
    .expect("roots did not run concurrently")
    .unwrap();

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert!(handler.max_in_flight() >= 2);
}

#[tokio::test]
async fn test_concurrency_limit_is_honoured() {
    let handler = Arc::new(ScriptedHandler::new().with_delay(Duration::from_millis(10)));
    let executor = executor_with(
        handler.clone(),
        Arc::new(RecordingNotifier::new()),
        fast_settings().with_max_concurrency(1),
    );

    let report = executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(handler.max_in_flight(), 1);
}

#[tokio::test]
async fn test_fan_in_waits_for_slowest_parent() {
    let handler = Arc::new(
        ScriptedHandler::new()
            .script(CREATE_CLUSTER, Script::FailTimes(3))
            .with_delay(Duration::from_millis(2)),
    );
    let executor = executor_with(handler.clone(), Arc::new(RecordingNotifier::new()), fast_settings());
    let mut receiver = executor.events().subscribe();

    let report = executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();
    let events = drain_events(&mut receiver);

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    let export_done = event_index(&events, events::TASK_SUCCEEDED, EXPORT_TRAINING_TABLE).unwrap();
    let cluster_done = event_index(&events, events::TASK_SUCCEEDED, CREATE_CLUSTER).unwrap();
    let submit_started = event_index(&events, events::TASK_STARTED, SUBMIT_TRAINING_JOB).unwrap();
    assert!(export_done < submit_started);
    assert!(cluster_done < submit_started);
}

#[tokio::test]
async fn test_report_carries_outputs_and_transition_history() {
    let handler = Arc::new(ScriptedHandler::new());
    let executor = executor_with(handler, Arc::new(RecordingNotifier::new()), fast_settings());

    let report = executor
        .execute(logical_date(), Default::default())
        .await
        .unwrap();

    let summary = &report.tasks[WRITE_TRAINING_TABLE];
    assert_eq!(summary.output.as_ref().unwrap()["summary"], "write-training-table done");
    let path: Vec<(TaskRunState, TaskRunState)> = summary
        .transitions
        .iter()
        .map(|t| (t.from_state, t.to_state))
        .collect();
    assert_eq!(
        path,
        vec![
            (TaskRunState::Pending, TaskRunState::Running),
            (TaskRunState::Running, TaskRunState::Success),
        ]
    );

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["outcome"], "succeeded");
    assert_eq!(json["context"]["logical_date"], "2017-12-04");
}
