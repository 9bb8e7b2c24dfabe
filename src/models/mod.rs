pub mod run;
pub mod task;
pub mod template;

pub use run::{RunContext, RunOutcome, RunReport, TaskRunSummary};
pub use task::{
    ClusterSpec, ClusterTeardown, ComputeJob, ExportFormat, QueryExport, TaskDefinition, TaskId,
    TaskKind, TaskPayload, WarehouseQuery, WriteMode,
};
pub use template::{TemplateError, UriTemplate};
