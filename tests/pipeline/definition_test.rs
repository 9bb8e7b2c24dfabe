use std::collections::BTreeSet;
use std::sync::Arc;

use store_recs::config::PipelineConfig;
use store_recs::constants::task_ids::*;
use store_recs::models::{ClusterTeardown, TaskDefinition, TaskPayload};
use store_recs::orchestration::{
    CancellationHandle, ExecutorSettings, HandlerRegistry, PipelineExecutor,
};
use store_recs::pipeline::{define_pipeline, PipelineBuilder};
use store_recs::{PipelineError, RunOutcome, TaskKind};

fn upstream_set(pipeline: &store_recs::Pipeline, task_id: &str) -> BTreeSet<String> {
    pipeline
        .upstream_of(task_id)
        .map(ToString::to_string)
        .collect()
}

#[test]
fn test_declared_graph_matches_dependency_table() {
    let pipeline = define_pipeline(&PipelineConfig::default()).unwrap();

    let expected: [(&str, TaskKind, &[&str]); 5] = [
        (WRITE_TRAINING_TABLE, TaskKind::RunWarehouseQuery, &[]),
        (
            EXPORT_TRAINING_TABLE,
            TaskKind::ExportQueryResult,
            &[WRITE_TRAINING_TABLE],
        ),
        (CREATE_CLUSTER, TaskKind::CreateComputeCluster, &[]),
        (
            SUBMIT_TRAINING_JOB,
            TaskKind::SubmitComputeJob,
            &[EXPORT_TRAINING_TABLE, CREATE_CLUSTER],
        ),
        (
            DELETE_CLUSTER,
            TaskKind::DeleteComputeCluster,
            &[SUBMIT_TRAINING_JOB],
        ),
    ];

    for (task_id, kind, upstream) in expected {
        let task = pipeline.task(task_id).unwrap();
        assert_eq!(task.kind(), kind, "kind of {task_id}");
        let want: BTreeSet<String> = upstream.iter().map(|s| s.to_string()).collect();
        assert_eq!(upstream_set(&pipeline, task_id), want, "upstream of {task_id}");
    }
    assert_eq!(pipeline.edge_count(), 4);
}

#[test]
fn test_repeated_dependency_registration_is_idempotent() {
    let teardown = |name: &str| {
        TaskPayload::DeleteComputeCluster(ClusterTeardown {
            cluster_name: name.to_string(),
            project_id: None,
        })
    };

    let mut builder = PipelineBuilder::new("idempotence");
    builder
        .add_task(TaskDefinition::new("a", teardown("a")))
        .add_task(TaskDefinition::new("b", teardown("b")))
        .add_task(TaskDefinition::new("c", teardown("c")));
    builder
        .add_dependency(["a", "b"], "c")
        .add_dependency(["a", "b"], "c")
        .add_dependency(["a"], "c");

    let pipeline = builder.build().unwrap();
    assert_eq!(pipeline.edge_count(), 2);
}

#[test]
fn test_dangling_edge_is_a_configuration_error() {
    let mut builder = PipelineBuilder::new("dangling");
    builder.add_task(TaskDefinition::new(
        "only",
        TaskPayload::DeleteComputeCluster(ClusterTeardown {
            cluster_name: "c".to_string(),
            project_id: None,
        }),
    ));
    builder.add_dependency(["missing"], "only");

    let err = builder.build().unwrap_err();
    assert!(err.is_configuration_error());
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_cluster_settings_flow_into_every_cluster_task() {
    let mut config = PipelineConfig::default();
    config.cluster.name = "recs-train".to_string();
    let pipeline = define_pipeline(&config).unwrap();

    for task in pipeline.tasks() {
        match &task.payload {
            TaskPayload::CreateComputeCluster(spec) => assert_eq!(spec.cluster_name, "recs-train"),
            TaskPayload::SubmitComputeJob(job) => assert_eq!(job.cluster_name, "recs-train"),
            TaskPayload::DeleteComputeCluster(t) => assert_eq!(t.cluster_name, "recs-train"),
            _ => {}
        }
    }
}

#[test]
fn test_unreadable_query_file_fails_definition() {
    let mut config = PipelineConfig::default();
    config.warehouse.query_file = Some("/nonexistent/store_recs.sql".into());
    assert!(matches!(
        define_pipeline(&config),
        Err(PipelineError::ConfigurationError(_))
    ));
}

#[tokio::test]
async fn test_one_pipeline_serves_concurrent_runs() {
    let config = PipelineConfig::default();
    let pipeline = Arc::new(define_pipeline(&config).unwrap());
    let (handlers, recorder) = HandlerRegistry::with_dry_run();
    let executor = PipelineExecutor::new(
        pipeline.clone(),
        handlers,
        ExecutorSettings::from_config(&config),
    )
    .unwrap();

    let first = chrono::NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    let second = chrono::NaiveDate::from_ymd_opt(2018, 1, 2).unwrap();
    let (a, b) = tokio::join!(
        executor.execute(first, CancellationHandle::new()),
        executor.execute(second, CancellationHandle::new()),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.outcome, RunOutcome::Succeeded);
    assert_eq!(b.outcome, RunOutcome::Succeeded);
    assert_ne!(a.context.run_id, b.context.run_id);

    let export_uris: BTreeSet<String> = recorder
        .invocations()
        .into_iter()
        .filter(|inv| inv.task_id.as_str() == EXPORT_TRAINING_TABLE)
        .map(|inv| inv.parameters["destination_uris"][0].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        export_uris,
        BTreeSet::from([
            "gs://store_recs/development/training/2018-01-01/store_recs_train_*.json".to_string(),
            "gs://store_recs/development/training/2018-01-02/store_recs_train_*.json".to_string(),
        ])
    );
    assert_eq!(Arc::strong_count(&pipeline), 2);
}
