// src/dag/unit.rs

//! Units handed from the schedulers to the executor.

use crate::job::{JobKind, UnitId, Work};

/// Description of a unit that the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledUnit {
    pub id: UnitId,
    pub work: Work,
    /// Stage the unit belongs to (stage mode only).
    pub stage: Option<String>,
}

impl ScheduledUnit {
    pub fn kind(&self) -> JobKind {
        self.work.kind()
    }
}
