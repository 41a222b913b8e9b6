// src/job/status.rs

use std::collections::BTreeMap;
use std::fmt;

use crate::job::UnitId;
use crate::types::ScheduleMode;

/// Status of a schedulable unit (graph node or stage member).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Waiting on dependencies (graph) or on its stage (stage mode).
    Pending,
    /// Ready to run; waiting for a free worker slot.
    Ready,
    Running,
    Succeeded,
    /// Succeeded, but a member tolerated its own failure.
    SucceededWithWarning(String),
    Failed(String),
    /// Artifact is up to date; nothing ran.
    SkippedFresh,
    /// Outside the requested targets/stages.
    SkippedNotRequested,
    /// A prerequisite (named) failed or was skipped for that reason.
    SkippedUpstreamFailed(UnitId),
    /// An earlier stage failed, so this stage never started.
    SkippedStageHalted,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            JobStatus::Pending | JobStatus::Ready | JobStatus::Running
        )
    }

    /// Whether units depending on this one may run.
    pub fn satisfies_dependents(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::SucceededWithWarning(_) | JobStatus::SkippedFresh
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            JobStatus::Failed(_)
                | JobStatus::SkippedUpstreamFailed(_)
                | JobStatus::SkippedStageHalted
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => f.write_str("pending"),
            JobStatus::Ready => f.write_str("ready"),
            JobStatus::Running => f.write_str("running"),
            JobStatus::Succeeded => f.write_str("succeeded"),
            JobStatus::SucceededWithWarning(w) => write!(f, "succeeded with warning: {w}"),
            JobStatus::Failed(e) => write!(f, "failed: {e}"),
            JobStatus::SkippedFresh => f.write_str("up to date"),
            JobStatus::SkippedNotRequested => f.write_str("not requested"),
            JobStatus::SkippedUpstreamFailed(dep) => write!(f, "skipped: '{dep}' failed"),
            JobStatus::SkippedStageHalted => f.write_str("skipped: an earlier stage failed"),
        }
    }
}

/// Outcome of one build invocation.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub mode: ScheduleMode,
    /// Terminal status of every unit, keyed by unit id.
    pub statuses: BTreeMap<UnitId, JobStatus>,
    /// Units in the order they were handed to a worker.
    pub dispatch_order: Vec<UnitId>,
    pub success: bool,
}

impl BuildResult {
    /// Assemble a result; the build succeeds when no unit failed and every
    /// unit reached a terminal state.
    pub fn new(
        mode: ScheduleMode,
        statuses: BTreeMap<UnitId, JobStatus>,
        dispatch_order: Vec<UnitId>,
    ) -> Self {
        let success = statuses
            .values()
            .all(|s| s.satisfies_dependents() || *s == JobStatus::SkippedNotRequested);
        Self {
            mode,
            statuses,
            dispatch_order,
            success,
        }
    }

    pub fn status(&self, unit: &str) -> Option<&JobStatus> {
        self.statuses.get(unit)
    }

    /// Units that actually ran and succeeded (with or without warning).
    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.statuses.iter().filter_map(|(id, s)| {
            matches!(s, JobStatus::Succeeded | JobStatus::SucceededWithWarning(_))
                .then_some(id.as_str())
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.statuses
            .iter()
            .filter_map(|(id, s)| s.is_failure().then_some(id.as_str()))
    }

    pub fn warnings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.statuses.iter().filter_map(|(id, s)| match s {
            JobStatus::SucceededWithWarning(w) => Some((id.as_str(), w.as_str())),
            _ => None,
        })
    }
}
