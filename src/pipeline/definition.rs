//! The store-recommendations training DAG.
//!
//! Five tasks: the training table is written and exported while a transient
//! cluster comes up; the training job waits for both; the cluster is deleted
//! once the job succeeds.

use tracing::debug;

use super::{Pipeline, PipelineBuilder, TaskDefaults};
use crate::config::PipelineConfig;
use crate::constants::task_ids::{
    CREATE_CLUSTER, DELETE_CLUSTER, EXPORT_TRAINING_TABLE, SUBMIT_TRAINING_JOB,
    WRITE_TRAINING_TABLE,
};
use crate::error::Result;
use crate::models::{
    ClusterSpec, ClusterTeardown, ComputeJob, QueryExport, TaskDefinition, TaskPayload,
    WarehouseQuery,
};

/// Build the training pipeline from configuration.
///
/// Deterministic for a given configuration. Fails with a configuration error
/// when the query file cannot be read or the wiring is invalid.
pub fn define_pipeline(config: &PipelineConfig) -> Result<Pipeline> {
    let identity = &config.identity;

    let write_training_table = TaskPayload::RunWarehouseQuery(WarehouseQuery {
        destination_table: config.warehouse.destination_table.clone(),
        write_mode: config.warehouse.write_mode,
        allow_large_results: config.warehouse.allow_large_results,
        use_legacy_sql: config.warehouse.use_legacy_sql,
        query: config.warehouse.query_text()?,
        on_behalf_of: identity.delegate_to.clone(),
    });

    let export_training_table = TaskPayload::ExportQueryResult(QueryExport {
        source_table: config.export_source_table().to_string(),
        destination_uris: config.export.destination_uri_templates.clone(),
        export_format: config.export.export_format,
        on_behalf_of: identity.delegate_to.clone(),
    });

    let create_cluster = TaskPayload::CreateComputeCluster(ClusterSpec {
        cluster_name: config.cluster.name.clone(),
        project_id: identity.project_id.clone(),
        num_workers: config.cluster.num_workers,
        master_machine_type: config.cluster.master_machine_type.clone(),
        worker_machine_type: config.cluster.worker_machine_type.clone(),
        zone: config.cluster.zone.clone(),
        storage_bucket: config.cluster.storage_bucket.clone(),
        properties: config.cluster.properties.clone(),
        init_action_uris: config.cluster.init_action_uris.clone(),
        service_account: identity.service_account.clone(),
        service_account_scopes: identity.service_account_scopes.clone(),
        connection_id: identity.connection_id.clone(),
        on_behalf_of: identity.delegate_to.clone(),
    });

    let submit_training_job = TaskPayload::SubmitComputeJob(ComputeJob {
        cluster_name: config.cluster.name.clone(),
        main_uri: config.job.main_uri.clone(),
    });

    let delete_cluster = TaskPayload::DeleteComputeCluster(ClusterTeardown {
        cluster_name: config.cluster.name.clone(),
        project_id: identity.project_id.clone(),
    });

    let mut builder = PipelineBuilder::new(config.pipeline.dag_id.clone())
        .with_schedule(config.pipeline.schedule)
        .with_start_date(config.pipeline.start_date)
        .with_defaults(TaskDefaults::from_config(config));

    builder
        .add_task(TaskDefinition::new(WRITE_TRAINING_TABLE, write_training_table))
        .add_task(TaskDefinition::new(EXPORT_TRAINING_TABLE, export_training_table))
        .add_task(TaskDefinition::new(CREATE_CLUSTER, create_cluster))
        .add_task(TaskDefinition::new(SUBMIT_TRAINING_JOB, submit_training_job))
        .add_task(TaskDefinition::new(DELETE_CLUSTER, delete_cluster));

    builder
        .add_dependency([WRITE_TRAINING_TABLE], EXPORT_TRAINING_TABLE)
        .add_dependency([EXPORT_TRAINING_TABLE, CREATE_CLUSTER], SUBMIT_TRAINING_JOB)
        .add_dependency([SUBMIT_TRAINING_JOB], DELETE_CLUSTER);

    builder.add_teardown(DELETE_CLUSTER, CREATE_CLUSTER);

    let pipeline = builder.build()?;

    debug!(
        dag_id = %pipeline.dag_id(),
        tasks = pipeline.task_count(),
        edges = pipeline.edge_count(),
        "Pipeline defined"
    );

    Ok(pipeline)
}
