//! # Pipeline Graph
//!
//! A [`Pipeline`] is the immutable task-dependency graph: task definitions on
//! one side, explicit adjacency data (task id to the set of its upstream task
//! ids) on the other. It is produced once by [`PipelineBuilder::build`], which
//! rejects dangling edge references, duplicate ids and cycles, and is then
//! shared read-only by every run.
//!
//! ```rust
//! use store_recs::models::{ComputeJob, TaskDefinition, TaskPayload};
//! use store_recs::pipeline::PipelineBuilder;
//!
//! # fn main() -> store_recs::Result<()> {
//! let job = |cluster: &str| {
//!     TaskPayload::SubmitComputeJob(ComputeJob {
//!         cluster_name: cluster.to_string(),
//!         main_uri: "gs://bucket/job.py".to_string(),
//!     })
//! };
//!
//! let mut builder = PipelineBuilder::new("example");
//! builder
//!     .add_task(TaskDefinition::new("a", job("c1")))
//!     .add_task(TaskDefinition::new("b", job("c1")))
//!     .add_dependency(["a"], "b");
//! let pipeline = builder.build()?;
//! assert_eq!(pipeline.edge_count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod definition;

use chrono::NaiveDate;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::config::{NotificationConfig, PipelineConfig, PipelineSettings, RetryConfig};
use crate::error::{PipelineError, Result};
use crate::models::{TaskDefinition, TaskId};
use crate::schedule::Schedule;

pub use definition::define_pipeline;

/// Settings applied to every task of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDefaults {
    pub owner: String,
    pub retry: RetryConfig,
    pub notifications: NotificationConfig,
}

impl Default for TaskDefaults {
    fn default() -> Self {
        Self {
            owner: PipelineSettings::default().owner,
            retry: RetryConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl TaskDefaults {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            owner: config.pipeline.owner.clone(),
            retry: config.retry,
            notifications: config.notifications.clone(),
        }
    }
}

/// A cleanup task paired with the task whose resource it releases
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Teardown {
    pub task: TaskId,
    pub resource: TaskId,
}

/// Immutable, validated task-dependency graph
#[derive(Debug, Clone, Serialize)]
pub struct Pipeline {
    dag_id: String,
    schedule: Schedule,
    start_date: NaiveDate,
    defaults: TaskDefaults,
    tasks: BTreeMap<TaskId, TaskDefinition>,
    declaration_order: Vec<TaskId>,
    upstream: BTreeMap<TaskId, BTreeSet<TaskId>>,
    teardowns: Vec<Teardown>,
    topological_order: Vec<TaskId>,
}

impl Pipeline {
    pub fn dag_id(&self) -> &str {
        &self.dag_id
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn defaults(&self) -> &TaskDefaults {
        &self.defaults
    }

    pub fn task(&self, task_id: &str) -> Option<&TaskDefinition> {
        self.tasks.get(task_id)
    }

    /// Tasks in declaration order
    pub fn tasks(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.declaration_order
            .iter()
            .filter_map(|id| self.tasks.get(id))
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.declaration_order.iter()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Upstream set of a task; empty for roots and unknown ids
    pub fn upstream_of(&self, task_id: &str) -> impl Iterator<Item = &TaskId> {
        self.upstream.get(task_id).into_iter().flatten()
    }

    pub fn downstream_of<'a>(&'a self, task_id: &'a str) -> impl Iterator<Item = &'a TaskId> + 'a {
        self.upstream
            .iter()
            .filter(move |(_, upstream)| upstream.contains(task_id))
            .map(|(downstream, _)| downstream)
    }

    /// Edges as `(upstream, downstream)` pairs
    pub fn edges(&self) -> Vec<(&TaskId, &TaskId)> {
        self.upstream
            .iter()
            .flat_map(|(downstream, upstream)| upstream.iter().map(move |u| (u, downstream)))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.upstream.values().map(BTreeSet::len).sum()
    }

    /// Tasks with no upstream dependencies, in declaration order
    pub fn roots(&self) -> Vec<&TaskId> {
        self.declaration_order
            .iter()
            .filter(|id| self.upstream_of(id.as_str()).next().is_none())
            .collect()
    }

    /// One valid execution order respecting every edge
    pub fn topological_order(&self) -> &[TaskId] {
        &self.topological_order
    }

    pub fn teardowns(&self) -> &[Teardown] {
        &self.teardowns
    }
}

/// Collects tasks and edges, then validates them into a [`Pipeline`]
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    dag_id: String,
    schedule: Schedule,
    start_date: NaiveDate,
    defaults: TaskDefaults,
    tasks: Vec<TaskDefinition>,
    upstream: BTreeMap<TaskId, BTreeSet<TaskId>>,
    teardowns: Vec<Teardown>,
}

impl PipelineBuilder {
    pub fn new(dag_id: impl Into<String>) -> Self {
        let settings = PipelineSettings::default();
        Self {
            dag_id: dag_id.into(),
            schedule: settings.schedule,
            start_date: settings.start_date,
            defaults: TaskDefaults::default(),
            tasks: Vec::new(),
            upstream: BTreeMap::new(),
            teardowns: Vec::new(),
        }
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self
    }

    pub fn with_defaults(mut self, defaults: TaskDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn add_task(&mut self, task: TaskDefinition) -> &mut Self {
        self.tasks.push(task);
        self
    }

    /// Register edges so that `downstream` depends on every task in `upstream`.
    ///
    /// Registering the same pair again is a no-op. References are checked in
    /// [`build`](Self::build), so tasks may be declared after their edges.
    pub fn add_dependency<I, T>(&mut self, upstream: I, downstream: impl Into<TaskId>) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TaskId>,
    {
        self.upstream
            .entry(downstream.into())
            .or_default()
            .extend(upstream.into_iter().map(Into::into));
        self
    }

    /// Pair a cleanup task with the task whose resource it releases
    pub fn add_teardown(
        &mut self,
        teardown: impl Into<TaskId>,
        resource: impl Into<TaskId>,
    ) -> &mut Self {
        let entry = Teardown {
            task: teardown.into(),
            resource: resource.into(),
        };
        if !self.teardowns.contains(&entry) {
            self.teardowns.push(entry);
        }
        self
    }

    pub fn build(&self) -> Result<Pipeline> {
        let mut tasks = BTreeMap::new();
        let mut declaration_order = Vec::with_capacity(self.tasks.len());
        for task in &self.tasks {
            if tasks.insert(task.id.clone(), task.clone()).is_some() {
                return Err(PipelineError::DuplicateTask {
                    task_id: task.id.to_string(),
                });
            }
            declaration_order.push(task.id.clone());
        }

        let ensure_declared = |task_id: &TaskId| -> Result<()> {
            if tasks.contains_key(task_id) {
                Ok(())
            } else {
                Err(PipelineError::UnknownTask {
                    task_id: task_id.to_string(),
                })
            }
        };

        for (downstream, upstream) in &self.upstream {
            ensure_declared(downstream)?;
            for task_id in upstream {
                ensure_declared(task_id)?;
                if task_id == downstream {
                    return Err(PipelineError::CycleDetected {
                        task_id: task_id.to_string(),
                    });
                }
            }
        }
        for teardown in &self.teardowns {
            ensure_declared(&teardown.task)?;
            ensure_declared(&teardown.resource)?;
        }

        let topological_order = Self::topological_order(&declaration_order, &self.upstream)?;

        let mut upstream: BTreeMap<TaskId, BTreeSet<TaskId>> = declaration_order
            .iter()
            .map(|id| (id.clone(), BTreeSet::new()))
            .collect();
        for (downstream, parents) in &self.upstream {
            upstream
                .entry(downstream.clone())
                .or_default()
                .extend(parents.iter().cloned());
        }

        Ok(Pipeline {
            dag_id: self.dag_id.clone(),
            schedule: self.schedule,
            start_date: self.start_date,
            defaults: self.defaults.clone(),
            tasks,
            declaration_order,
            upstream,
            teardowns: self.teardowns.clone(),
            topological_order,
        })
    }

    fn topological_order(
        declaration_order: &[TaskId],
        upstream: &BTreeMap<TaskId, BTreeSet<TaskId>>,
    ) -> Result<Vec<TaskId>> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for task_id in declaration_order {
            graph.add_node(task_id.as_str());
        }
        for (downstream, parents) in upstream {
            for parent in parents {
                graph.add_edge(parent.as_str(), downstream.as_str(), ());
            }
        }

        let sorted = toposort(&graph, None).map_err(|cycle| PipelineError::CycleDetected {
            task_id: cycle.node_id().to_string(),
        })?;

        let seen: HashSet<&str> = sorted.iter().copied().collect();
        debug_assert_eq!(seen.len(), declaration_order.len());

        Ok(sorted.into_iter().map(TaskId::from).collect())
    }
}
