use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::dag::freshness::Freshness;
use crate::dag::graph::DependencyGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::StateManager;
use crate::engine::UnitOutcome;
use crate::errors::Result;
use crate::job::{JobStatus, UnitId};

/// Graph-mode scheduler: the dependency graph plus per-node build state.
///
/// It is responsible for:
/// - restricting the build to the requested targets and their prerequisites
/// - skipping targets whose artifacts are fresh
/// - deciding when a stale target is ready (all dependencies satisfied)
/// - skipping every dependent of a failed target
#[derive(Debug)]
pub struct GraphScheduler {
    graph: DependencyGraph,
}

impl GraphScheduler {
    /// Construct a scheduler from a graph whose freshness has been computed.
    ///
    /// An empty `requested` list builds every target.
    pub fn new(mut graph: DependencyGraph, requested: &[String]) -> Result<Self> {
        let closure: Option<HashSet<String>> = if requested.is_empty() {
            None
        } else {
            Some(graph.closure_of(requested)?)
        };

        for node in graph.nodes_mut() {
            let in_scope = closure.as_ref().is_none_or(|c| c.contains(&node.target));
            node.status = if !in_scope {
                JobStatus::SkippedNotRequested
            } else {
                match (&node.freshness, node.is_leaf()) {
                    (Freshness::Fresh, _) => JobStatus::SkippedFresh,
                    (Freshness::Error(e), _) => JobStatus::Failed(e.clone()),
                    (Freshness::Stale, true) => JobStatus::Failed(format!(
                        "artifact '{}' does not exist and no job produces it",
                        node.target
                    )),
                    // A leaf that was never stat-ed is taken as pre-existing.
                    (Freshness::Unknown, true) => JobStatus::SkippedFresh,
                    (Freshness::Stale | Freshness::Unknown, false) => JobStatus::Pending,
                }
            };
        }

        Ok(Self { graph })
    }

    /// Resolve statuses known before anything runs and return the first
    /// batch of ready targets.
    pub fn start(&mut self) -> SchedulerStep {
        let mut resolved: Vec<(UnitId, JobStatus)> = self
            .graph
            .nodes()
            .filter(|n| n.status.is_terminal())
            .map(|n| (n.target.clone(), n.status.clone()))
            .collect();

        let failed: Vec<UnitId> = resolved
            .iter()
            .filter(|(_, s)| matches!(s, JobStatus::Failed(_)))
            .map(|(id, _)| id.clone())
            .collect();

        let mut manager = StateManager::new(&mut self.graph);
        for target in failed {
            warn!(target = %target, "target failed before execution; skipping dependents");
            resolved.extend(manager.mark_dependents_skipped(&target));
        }

        let newly_ready = manager.collect_new_ready();
        let finished = manager.all_terminal();

        info!(
            ready = newly_ready.len(),
            resolved = resolved.len(),
            "graph build started"
        );

        SchedulerStep {
            newly_ready,
            resolved,
            finished,
        }
    }

    /// Record that a ready target has been handed to a worker.
    pub fn mark_running(&mut self, target: &str) {
        match self.graph.node_mut(target) {
            Some(node) if node.status == JobStatus::Ready => node.status = JobStatus::Running,
            Some(node) => warn!(
                target = %target,
                status = %node.status,
                "mark_running for a target that is not ready; ignoring"
            ),
            None => warn!(target = %target, "mark_running for unknown target; ignoring"),
        }
    }

    /// Handle completion of a target's work.
    pub fn complete(&mut self, target: &str, outcome: UnitOutcome) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        let Some(node) = self.graph.node_mut(target) else {
            warn!(target = %target, "completion for unknown target; ignoring");
            step.finished = StateManager::new(&mut self.graph).all_terminal();
            return step;
        };

        if node.status.is_terminal() {
            warn!(
                target = %target,
                status = %node.status,
                "completion for a target that already finished; ignoring"
            );
            step.finished = StateManager::new(&mut self.graph).all_terminal();
            return step;
        }

        let status = outcome.into_status();
        let failed = !status.satisfies_dependents();
        debug!(target = %target, status = %status, "target completed");
        node.status = status;

        let mut manager = StateManager::new(&mut self.graph);
        if failed {
            step.resolved = manager.mark_dependents_skipped(target);
        } else {
            step.newly_ready = manager.collect_new_ready();
        }
        step.finished = manager.all_terminal();
        step
    }

    pub fn is_finished(&self) -> bool {
        self.graph.nodes().all(|n| n.status.is_terminal())
    }

    pub fn status_of(&self, target: &str) -> Option<&JobStatus> {
        self.graph.node(target).map(|n| &n.status)
    }

    pub fn statuses(&self) -> BTreeMap<UnitId, JobStatus> {
        self.graph
            .nodes()
            .map(|n| (n.target.clone(), n.status.clone()))
            .collect()
    }

    /// Number of targets currently handed to workers.
    pub fn running_count(&self) -> usize {
        self.graph
            .nodes()
            .filter(|n| n.status == JobStatus::Running)
            .count()
    }
}
