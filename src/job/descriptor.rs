// src/job/descriptor.rs

use std::collections::HashSet;

use crate::errors::{BuildError, Result};
use crate::job::Work;
use crate::types::ScheduleMode;

/// Where a piece of work sits in the build: a node of the dependency graph,
/// or a member of a stage (`None` is the implicit default stage).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Target {
        target: String,
        dependencies: Vec<String>,
    },
    Stage(Option<String>),
}

/// A validated job (or task sequence) together with its placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub work: Work,
    pub placement: Placement,
}

impl JobDescriptor {
    pub fn target(work: impl Into<Work>, target: impl Into<String>, dependencies: Vec<String>) -> Self {
        Self {
            work: work.into(),
            placement: Placement::Target {
                target: target.into(),
                dependencies,
            },
        }
    }

    pub fn stage(work: impl Into<Work>, stage: Option<String>) -> Self {
        Self {
            work: work.into(),
            placement: Placement::Stage(stage),
        }
    }

    pub fn target_name(&self) -> Option<&str> {
        match &self.placement {
            Placement::Target { target, .. } => Some(target),
            Placement::Stage(_) => None,
        }
    }

    pub fn stage_name(&self) -> Option<&str> {
        match &self.placement {
            Placement::Stage(stage) => stage.as_deref(),
            Placement::Target { .. } => None,
        }
    }
}

/// All descriptors of one build invocation, with the scheduling mode
/// resolved.
#[derive(Debug, Clone)]
pub struct BuildSpec {
    descriptors: Vec<JobDescriptor>,
    stage_order: Vec<String>,
    mode: ScheduleMode,
}

impl BuildSpec {
    /// Resolve the scheduling mode and reject specs that mix target-bearing
    /// and stage-bearing descriptors.
    ///
    /// `stage_order` is an optional explicit stage ordering; it is only
    /// meaningful in stage mode.
    pub fn new(descriptors: Vec<JobDescriptor>, stage_order: Vec<String>) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(BuildError::ConfigError(
                "build description contains no jobs".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for stage in &stage_order {
            if !seen.insert(stage.as_str()) {
                return Err(BuildError::ConfigError(format!(
                    "stage '{stage}' is declared more than once in `stages`"
                )));
            }
        }

        let targets: Vec<&str> = descriptors.iter().filter_map(|d| d.target_name()).collect();
        let staged = descriptors.len() - targets.len();

        let mode = if targets.is_empty() {
            ScheduleMode::Stage
        } else if staged == 0 {
            ScheduleMode::Graph
        } else {
            let example = descriptors
                .iter()
                .find(|d| d.target_name().is_none())
                .map(|d| d.stage_name().unwrap_or("<default stage>").to_string())
                .unwrap_or_default();
            return Err(BuildError::ConfigError(format!(
                "build mixes target/dependency jobs ({}) with stage jobs (e.g. stage '{}'); use one scheduling mode per build",
                targets.join(", "),
                example
            )));
        };

        if mode == ScheduleMode::Graph && !stage_order.is_empty() {
            return Err(BuildError::ConfigError(
                "`stages` ordering cannot be used with target/dependency jobs".to_string(),
            ));
        }

        Ok(Self {
            descriptors,
            stage_order,
            mode,
        })
    }

    pub fn mode(&self) -> ScheduleMode {
        self.mode
    }

    pub fn descriptors(&self) -> &[JobDescriptor] {
        &self.descriptors
    }

    pub fn stage_order(&self) -> &[String] {
        &self.stage_order
    }

    pub fn into_parts(self) -> (Vec<JobDescriptor>, Vec<String>) {
        (self.descriptors, self.stage_order)
    }

    /// Every function name referenced by any descriptor.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().flat_map(|d| d.work.function_names())
    }
}
