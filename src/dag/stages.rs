// src/dag/stages.rs

use std::collections::HashMap;

use tracing::debug;

use crate::errors::{BuildError, Result};
use crate::job::{JobDescriptor, Placement, UnitId, Work};

/// Name of the implicit stage holding jobs without a stage label. It always
/// exists and always runs first.
pub const DEFAULT_STAGE: &str = "_default";

#[derive(Debug, Clone)]
pub struct StageMember {
    pub id: UnitId,
    pub work: Work,
}

/// A group of jobs with no ordering between them.
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: String,
    pub members: Vec<StageMember>,
}

impl Stage {
    fn new(name: String) -> Self {
        Self {
            name,
            members: Vec::new(),
        }
    }

    fn push(&mut self, work: Work) {
        let id = format!("{}:{}", self.name, self.members.len());
        self.members.push(StageMember { id, work });
    }
}

/// Stages in execution order.
#[derive(Debug, Clone)]
pub struct StagePlan {
    stages: Vec<Stage>,
}

impl StagePlan {
    /// Group stage-bearing descriptors.
    ///
    /// Order: the default stage, then the `declared` stages in declared
    /// order, then any remaining stage in the order its label first appears.
    pub fn group(descriptors: Vec<JobDescriptor>, declared: &[String]) -> Result<Self> {
        let mut stages = vec![Stage::new(DEFAULT_STAGE.to_string())];
        let mut positions: HashMap<String, usize> = HashMap::new();
        positions.insert(DEFAULT_STAGE.to_string(), 0);

        for name in declared {
            if positions.contains_key(name) {
                return Err(BuildError::ConfigError(format!(
                    "stage '{name}' is declared more than once"
                )));
            }
            positions.insert(name.clone(), stages.len());
            stages.push(Stage::new(name.clone()));
        }

        for descriptor in descriptors {
            let name = match descriptor.placement {
                Placement::Stage(stage) => stage.unwrap_or_else(|| DEFAULT_STAGE.to_string()),
                Placement::Target { target, .. } => {
                    return Err(BuildError::ConfigError(format!(
                        "target '{target}' cannot be placed in a stage plan"
                    )));
                }
            };

            let pos = match positions.get(&name) {
                Some(pos) => *pos,
                None => {
                    let pos = stages.len();
                    positions.insert(name.clone(), pos);
                    stages.push(Stage::new(name));
                    pos
                }
            };
            stages[pos].push(descriptor.work);
        }

        debug!(
            stages = ?stages.iter().map(|s| (s.name.as_str(), s.members.len())).collect::<Vec<_>>(),
            "stage plan built"
        );
        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
