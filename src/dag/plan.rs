// src/dag/plan.rs

use std::collections::BTreeMap;

use tracing::info;

use crate::dag::freshness::FreshnessOracle;
use crate::dag::graph::DependencyGraph;
use crate::dag::scheduler::GraphScheduler;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::stage_scheduler::StageScheduler;
use crate::dag::stages::StagePlan;
use crate::engine::UnitOutcome;
use crate::errors::Result;
use crate::job::{BuildSpec, JobStatus, UnitId};
use crate::types::ScheduleMode;

/// A prepared build: one of the two scheduling strategies, chosen once from
/// the shape of the spec.
#[derive(Debug)]
pub enum BuildPlan {
    Graph(GraphScheduler),
    Stages(StageScheduler),
}

impl BuildPlan {
    /// Build the graph (computing freshness) or group the stages, and
    /// restrict the build to `requested` targets/stages.
    pub fn prepare(spec: BuildSpec, oracle: &FreshnessOracle, requested: &[String]) -> Result<Self> {
        let mode = spec.mode();
        let (descriptors, stage_order) = spec.into_parts();
        info!(%mode, jobs = descriptors.len(), ?requested, "preparing build plan");

        match mode {
            ScheduleMode::Graph => {
                let mut graph = DependencyGraph::build(descriptors)?;
                graph.compute_freshness(oracle)?;
                Ok(BuildPlan::Graph(GraphScheduler::new(graph, requested)?))
            }
            ScheduleMode::Stage => {
                let plan = StagePlan::group(descriptors, &stage_order)?;
                Ok(BuildPlan::Stages(StageScheduler::new(plan, requested)?))
            }
        }
    }

    pub fn mode(&self) -> ScheduleMode {
        match self {
            BuildPlan::Graph(_) => ScheduleMode::Graph,
            BuildPlan::Stages(_) => ScheduleMode::Stage,
        }
    }

    pub fn start(&mut self) -> SchedulerStep {
        match self {
            BuildPlan::Graph(s) => s.start(),
            BuildPlan::Stages(s) => s.start(),
        }
    }

    pub fn mark_running(&mut self, unit: &str) {
        match self {
            BuildPlan::Graph(s) => s.mark_running(unit),
            BuildPlan::Stages(s) => s.mark_running(unit),
        }
    }

    pub fn complete(&mut self, unit: &str, outcome: UnitOutcome) -> SchedulerStep {
        match self {
            BuildPlan::Graph(s) => s.complete(unit, outcome),
            BuildPlan::Stages(s) => s.complete(unit, outcome),
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            BuildPlan::Graph(s) => s.is_finished(),
            BuildPlan::Stages(s) => s.is_finished(),
        }
    }

    pub fn status_of(&self, unit: &str) -> Option<&JobStatus> {
        match self {
            BuildPlan::Graph(s) => s.status_of(unit),
            BuildPlan::Stages(s) => s.status_of(unit),
        }
    }

    pub fn statuses(&self) -> BTreeMap<UnitId, JobStatus> {
        match self {
            BuildPlan::Graph(s) => s.statuses(),
            BuildPlan::Stages(s) => s.statuses(),
        }
    }

    pub fn running_count(&self) -> usize {
        match self {
            BuildPlan::Graph(s) => s.running_count(),
            BuildPlan::Stages(s) => s.running_count(),
        }
    }
}
