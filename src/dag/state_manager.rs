// src/dag/state_manager.rs

//! Per-build state transitions for nodes of the dependency graph.

use tracing::{debug, info};

use crate::dag::DependencyGraph;
use crate::dag::unit::ScheduledUnit;
use crate::job::{JobStatus, UnitId};

/// Manages status transitions of graph nodes.
pub struct StateManager<'a> {
    graph: &'a mut DependencyGraph,
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a mut DependencyGraph) -> Self {
        Self { graph }
    }

    /// Mark every pending transitive dependent of `failed` as skipped.
    ///
    /// Returns the newly skipped units (excluding `failed` itself).
    pub fn mark_dependents_skipped(&mut self, failed: &str) -> Vec<(UnitId, JobStatus)> {
        let mut stack = self.graph.dependents_of(failed);
        let mut newly_skipped = Vec::new();

        while let Some(name) = stack.pop() {
            let Some(node) = self.graph.node_mut(&name) else {
                continue;
            };
            if node.status != JobStatus::Pending {
                // Already terminal, or outside the requested set.
                continue;
            }

            let status = JobStatus::SkippedUpstreamFailed(failed.to_string());
            node.status = status.clone();
            debug!(
                target = %name,
                upstream = %failed,
                "marking dependent as skipped due to upstream failure"
            );
            newly_skipped.push((name.clone(), status));
            stack.extend(self.graph.dependents_of(&name));
        }

        newly_skipped
    }

    /// Collect pending nodes whose dependencies are all satisfied, mark them
    /// `Ready`, and return them as [`ScheduledUnit`]s.
    pub fn collect_new_ready(&mut self) -> Vec<ScheduledUnit> {
        // Decide first, then mutate to avoid borrowing issues.
        let graph: &DependencyGraph = self.graph;
        let candidates: Vec<String> = graph
            .nodes()
            .filter(|node| node.status == JobStatus::Pending && node.work.is_some())
            .filter(|node| deps_satisfied(graph, &node.target))
            .map(|node| node.target.clone())
            .collect();

        let mut ready = Vec::with_capacity(candidates.len());
        for target in candidates {
            if let Some(node) = self.graph.node_mut(&target) {
                let Some(work) = node.work.clone() else {
                    continue;
                };
                info!(target = %target, "dependencies satisfied; target ready to build");
                node.status = JobStatus::Ready;
                ready.push(ScheduledUnit {
                    id: target,
                    work,
                    stage: None,
                });
            }
        }
        ready
    }

    pub fn all_terminal(&self) -> bool {
        self.graph.nodes().all(|node| node.status.is_terminal())
    }
}

/// Whether every direct dependency of `target` lets it run.
///
/// Returns `false` for unknown targets.
fn deps_satisfied(graph: &DependencyGraph, target: &str) -> bool {
    let Some(node) = graph.node(target) else {
        return false;
    };
    node.dependencies.iter().all(|dep| {
        graph
            .node(dep)
            .is_some_and(|d| d.status.satisfies_dependents())
    })
}
