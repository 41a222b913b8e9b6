// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the schedulers.

use crate::dag::unit::ScheduledUnit;
use crate::job::{JobStatus, UnitId};

/// Structured result of a single scheduler "step".
///
/// This is useful for tests that want to manually step a build and make
/// assertions about what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Units that became ready to run as a result of this step.
    pub newly_ready: Vec<ScheduledUnit>,
    /// Units that reached a terminal state without running (skipped, or
    /// failed before dispatch), with that state.
    pub resolved: Vec<(UnitId, JobStatus)>,
    /// Whether every unit is now terminal.
    pub finished: bool,
}

impl SchedulerStep {
    pub fn ready_ids(&self) -> Vec<&str> {
        self.newly_ready.iter().map(|u| u.id.as_str()).collect()
    }
}
