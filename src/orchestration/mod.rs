//! # Orchestration
//!
//! In-process execution of a [`Pipeline`](crate::pipeline::Pipeline): readiness
//! evaluation, handler dispatch, retries with notifications, and cancellation.
//!
//! ## Core Components
//!
//! - **ReadinessEvaluator**: decides which tasks may start given a run's task states
//! - **PipelineExecutor**: the control loop driving one run to completion
//! - **HandlerRegistry**: maps each task kind to the handler performing the delegated call
//! - **Notifier**: receives retry and failure notices
//! - **CancellationHandle**: stops a run from outside

pub mod cancellation;
pub mod dry_run;
pub mod executor;
pub mod handler;
pub mod notifier;
pub mod readiness;

pub use cancellation::CancellationHandle;
pub use dry_run::{DryRunHandler, RecordedInvocation};
pub use executor::{ExecutorSettings, PipelineExecutor};
pub use handler::{HandlerRegistry, TaskHandler, TaskInvocation, TaskOutput};
pub use notifier::{
    LoggingNotifier, Notification, NotificationError, NotificationKind, Notifier,
};
pub use readiness::{ReadinessEvaluator, TaskReadinessStatus};
