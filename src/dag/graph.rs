// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use tracing::debug;

use crate::dag::freshness::{Freshness, FreshnessOracle};
use crate::errors::{BuildError, Result};
use crate::job::{JobDescriptor, JobStatus, Placement, Work};
use crate::types::CheckMethod;

/// One target in the dependency graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub target: String,
    /// Work producing this target; `None` for a leaf that is only ever
    /// referenced as a dependency (a pre-existing artifact).
    pub work: Option<Work>,
    /// Direct dependencies in declaration order.
    pub dependencies: Vec<String>,
    pub freshness: Freshness,
    pub status: JobStatus,
}

impl GraphNode {
    fn leaf(target: String) -> Self {
        Self {
            target,
            work: None,
            dependencies: Vec::new(),
            freshness: Freshness::Unknown,
            status: JobStatus::Pending,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.work.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Grey,
    Black,
}

/// Directed acyclic graph of targets.
///
/// Edges point from a target to the targets it depends on.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph from target-bearing descriptors and reject cycles.
    pub fn build(descriptors: Vec<JobDescriptor>) -> Result<Self> {
        let mut graph: DiGraph<GraphNode, ()> = DiGraph::new();
        let mut index: HashMap<String, NodeIndex> = HashMap::new();

        // First pass: one node per defined target.
        for descriptor in descriptors {
            let (target, dependencies) = match descriptor.placement {
                Placement::Target {
                    target,
                    dependencies,
                } => (target, dependencies),
                Placement::Stage(stage) => {
                    return Err(BuildError::ConfigError(format!(
                        "stage job ({}) cannot be added to a dependency graph",
                        stage.as_deref().unwrap_or("default stage")
                    )));
                }
            };

            if index.contains_key(&target) {
                return Err(BuildError::ConfigError(format!(
                    "target '{target}' is defined by more than one job"
                )));
            }

            let mut seen = HashSet::new();
            let dependencies: Vec<String> = dependencies
                .into_iter()
                .filter(|d| seen.insert(d.clone()))
                .collect();

            let idx = graph.add_node(GraphNode {
                target: target.clone(),
                work: Some(descriptor.work),
                dependencies,
                freshness: Freshness::Unknown,
                status: JobStatus::Pending,
            });
            index.insert(target, idx);
        }

        // Second pass: edges, creating leaves for undefined dependencies.
        let defined: Vec<NodeIndex> = graph.node_indices().collect();
        for idx in defined {
            let deps = graph[idx].dependencies.clone();
            for dep in deps {
                let dep_idx = match index.get(&dep) {
                    Some(i) => *i,
                    None => {
                        let i = graph.add_node(GraphNode::leaf(dep.clone()));
                        index.insert(dep, i);
                        i
                    }
                };
                graph.update_edge(idx, dep_idx, ());
            }
        }

        let dag = Self { graph, index };
        dag.check_acyclic()?;

        debug!(
            nodes = dag.graph.node_count(),
            edges = dag.graph.edge_count(),
            "dependency graph built"
        );
        Ok(dag)
    }

    /// Depth-first search with visiting/visited colouring; a grey node seen
    /// again is a back edge.
    fn check_acyclic(&self) -> Result<()> {
        let mut colour = vec![Colour::White; self.graph.node_count()];
        let mut path = Vec::new();

        for start in self.graph.node_indices() {
            if colour[start.index()] == Colour::White {
                if let Some(cycle) = self.visit(start, &mut colour, &mut path) {
                    return Err(BuildError::DependencyCycle(cycle));
                }
            }
        }
        Ok(())
    }

    fn visit(
        &self,
        node: NodeIndex,
        colour: &mut [Colour],
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<String>> {
        colour[node.index()] = Colour::Grey;
        path.push(node);

        for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
            match colour[next.index()] {
                Colour::Grey => {
                    let start = path.iter().position(|n| *n == next).unwrap_or(0);
                    let mut cycle: Vec<String> = path[start..]
                        .iter()
                        .map(|n| self.graph[*n].target.clone())
                        .collect();
                    cycle.push(self.graph[next].target.clone());
                    return Some(cycle);
                }
                Colour::White => {
                    if let Some(cycle) = self.visit(next, colour, path) {
                        return Some(cycle);
                    }
                }
                Colour::Black => {}
            }
        }

        path.pop();
        colour[node.index()] = Colour::Black;
        None
    }

    /// Node indices with every dependency before its dependents.
    fn build_order(&self) -> Result<Vec<NodeIndex>> {
        let mut order = toposort(&self.graph, None).map_err(|cycle| {
            BuildError::DependencyCycle(vec![self.graph[cycle.node_id()].target.clone()])
        })?;
        order.reverse();
        Ok(order)
    }

    /// Targets in an order that respects every dependency edge.
    pub fn topological_targets(&self) -> Result<Vec<&str>> {
        Ok(self
            .build_order()?
            .into_iter()
            .map(|idx| self.graph[idx].target.as_str())
            .collect())
    }

    /// Compute freshness of every node, dependencies first, so that a node
    /// whose dependency will be rebuilt is itself stale.
    pub fn compute_freshness(&mut self, oracle: &FreshnessOracle) -> Result<()> {
        let propagate = oracle.method() != CheckMethod::Ignore;

        for idx in self.build_order()? {
            let deps = || self.graph.neighbors_directed(idx, Direction::Outgoing);
            let upstream_error =
                deps().any(|dep| matches!(self.graph[dep].freshness, Freshness::Error(_)));
            let upstream_stale =
                propagate && deps().any(|dep| self.graph[dep].freshness == Freshness::Stale);

            let node = &self.graph[idx];
            // A dependency that could not be stat-ed fails on its own; this
            // node is left pending so it is skipped rather than failed twice.
            let freshness = if upstream_error {
                Freshness::Stale
            } else if node.is_leaf() {
                match oracle.modified(&node.target) {
                    Ok(Some(_)) => Freshness::Fresh,
                    Ok(None) => Freshness::Stale,
                    Err(e) => Freshness::Error(e.to_string()),
                }
            } else {
                match oracle.is_stale(&node.target, &node.dependencies) {
                    Ok(direct) if direct || upstream_stale => Freshness::Stale,
                    Ok(_) => Freshness::Fresh,
                    Err(e) => Freshness::Error(e.to_string()),
                }
            };

            debug!(target = %node.target, ?freshness, "freshness computed");
            self.graph[idx].freshness = freshness;
        }
        Ok(())
    }

    /// The requested targets plus all of their transitive prerequisites.
    pub fn closure_of(&self, requested: &[String]) -> Result<HashSet<String>> {
        let mut closure = HashSet::new();
        for target in requested {
            let start = *self
                .index
                .get(target)
                .ok_or_else(|| BuildError::UnknownTarget(target.clone()))?;
            let mut dfs = Dfs::new(&self.graph, start);
            while let Some(idx) = dfs.next(&self.graph) {
                closure.insert(self.graph[idx].target.clone());
            }
        }
        Ok(closure)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node(&self, target: &str) -> Option<&GraphNode> {
        self.index.get(target).map(|idx| &self.graph[*idx])
    }

    pub fn node_mut(&mut self, target: &str) -> Option<&mut GraphNode> {
        let idx = *self.index.get(target)?;
        Some(&mut self.graph[idx])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GraphNode> {
        self.graph.node_weights_mut()
    }

    /// Direct dependencies of `target`.
    pub fn dependencies_of(&self, target: &str) -> Vec<String> {
        self.node(target)
            .map(|n| n.dependencies.clone())
            .unwrap_or_default()
    }

    /// Targets that directly depend on `target`.
    pub fn dependents_of(&self, target: &str) -> Vec<String> {
        match self.index.get(target) {
            Some(idx) => self
                .graph
                .neighbors_directed(*idx, Direction::Incoming)
                .map(|n| self.graph[n].target.clone())
                .collect(),
            None => Vec::new(),
        }
    }
}
