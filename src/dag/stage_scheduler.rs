// src/dag/stage_scheduler.rs

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::stages::StagePlan;
use crate::dag::unit::ScheduledUnit;
use crate::engine::UnitOutcome;
use crate::errors::{BuildError, Result};
use crate::job::{JobStatus, UnitId};

/// Stage-mode scheduler.
///
/// Stages run strictly in plan order. Every member of the current stage is
/// released at once; the next stage opens only when the current one has
/// drained. A failure lets the current stage finish and then halts.
#[derive(Debug)]
pub struct StageScheduler {
    plan: StagePlan,
    statuses: HashMap<UnitId, JobStatus>,
    /// Index of the stage currently executing.
    current: usize,
    /// Index of the last stage that is part of this build.
    last: Option<usize>,
    halted: bool,
}

impl StageScheduler {
    /// An empty `requested` list runs every stage; otherwise every stage up
    /// to and including the last requested one runs.
    pub fn new(plan: StagePlan, requested: &[String]) -> Result<Self> {
        let last = if requested.is_empty() {
            plan.len().checked_sub(1)
        } else {
            let mut last = 0;
            for name in requested {
                let pos = plan
                    .position(name)
                    .ok_or_else(|| BuildError::UnknownTarget(name.clone()))?;
                last = last.max(pos);
            }
            Some(last)
        };

        let mut statuses = HashMap::new();
        for (pos, stage) in plan.stages().iter().enumerate() {
            let status = if last.is_some_and(|l| pos <= l) {
                JobStatus::Pending
            } else {
                JobStatus::SkippedNotRequested
            };
            for member in &stage.members {
                statuses.insert(member.id.clone(), status.clone());
            }
        }

        Ok(Self {
            plan,
            statuses,
            current: 0,
            last,
            halted: false,
        })
    }

    pub fn start(&mut self) -> SchedulerStep {
        let mut step = SchedulerStep {
            resolved: self
                .statuses
                .iter()
                .filter(|(_, s)| s.is_terminal())
                .map(|(id, s)| (id.clone(), s.clone()))
                .collect(),
            ..SchedulerStep::default()
        };
        step.resolved.sort_by(|a, b| a.0.cmp(&b.0));

        self.current = 0;
        self.open_stages(&mut step);
        step.finished = self.is_finished();
        step
    }

    /// Starting at `current`, release the first stage with pending members,
    /// stepping over empty stages.
    fn open_stages(&mut self, step: &mut SchedulerStep) {
        let Some(last) = self.last else {
            return;
        };

        while self.current <= last {
            let stage = &self.plan.stages()[self.current];
            let pending: Vec<_> = stage
                .members
                .iter()
                .filter(|m| self.statuses.get(&m.id) == Some(&JobStatus::Pending))
                .cloned()
                .collect();

            if !pending.is_empty() {
                info!(
                    stage = %stage.name,
                    jobs = pending.len(),
                    "starting stage"
                );
                let stage_name = stage.name.clone();
                for member in pending {
                    self.statuses.insert(member.id.clone(), JobStatus::Ready);
                    step.newly_ready.push(ScheduledUnit {
                        id: member.id,
                        work: member.work,
                        stage: Some(stage_name.clone()),
                    });
                }
                return;
            }

            debug!(stage = %stage.name, "stage has nothing to run; advancing");
            self.current += 1;
        }
    }

    fn current_stage_drained(&self) -> bool {
        self.plan
            .stages()
            .get(self.current)
            .is_none_or(|stage| {
                stage.members.iter().all(|m| {
                    self.statuses
                        .get(&m.id)
                        .is_none_or(|s| s.is_terminal())
                })
            })
    }

    pub fn mark_running(&mut self, unit: &str) {
        match self.statuses.get_mut(unit) {
            Some(status) if *status == JobStatus::Ready => *status = JobStatus::Running,
            Some(status) => warn!(
                unit = %unit,
                status = %status,
                "mark_running for a unit that is not ready; ignoring"
            ),
            None => warn!(unit = %unit, "mark_running for unknown unit; ignoring"),
        }
    }

    /// Handle completion of a stage member.
    pub fn complete(&mut self, unit: &str, outcome: UnitOutcome) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        match self.statuses.get_mut(unit) {
            Some(status) if !status.is_terminal() => {
                let new_status = outcome.into_status();
                if !new_status.satisfies_dependents() {
                    warn!(unit = %unit, status = %new_status, "stage job failed; halting after this stage");
                    self.halted = true;
                }
                *status = new_status;
            }
            Some(status) => {
                warn!(unit = %unit, status = %status, "completion for a unit that already finished; ignoring");
            }
            None => {
                warn!(unit = %unit, "completion for unknown unit; ignoring");
            }
        }

        if self.current_stage_drained() {
            if let Some(stage) = self.plan.stages().get(self.current) {
                info!(stage = %stage.name, "stage finished");
            }

            if self.halted {
                step.resolved = self.halt_remaining();
            } else {
                self.current += 1;
                self.open_stages(&mut step);
            }
        }

        step.finished = self.is_finished();
        step
    }

    /// Mark every member of every later stage as halted.
    fn halt_remaining(&mut self) -> Vec<(UnitId, JobStatus)> {
        let mut halted = Vec::new();
        for stage in self.plan.stages().iter().skip(self.current + 1) {
            for member in &stage.members {
                if let Some(status) = self.statuses.get_mut(&member.id) {
                    if *status == JobStatus::Pending {
                        *status = JobStatus::SkippedStageHalted;
                        halted.push((member.id.clone(), JobStatus::SkippedStageHalted));
                    }
                }
            }
        }
        if !halted.is_empty() {
            warn!(skipped = halted.len(), "later stages skipped after failure");
        }
        halted
    }

    pub fn is_finished(&self) -> bool {
        self.statuses.values().all(|s| s.is_terminal())
    }

    pub fn status_of(&self, unit: &str) -> Option<&JobStatus> {
        self.statuses.get(unit)
    }

    pub fn statuses(&self) -> BTreeMap<UnitId, JobStatus> {
        self.statuses
            .iter()
            .map(|(id, s)| (id.clone(), s.clone()))
            .collect()
    }

    pub fn running_count(&self) -> usize {
        self.statuses
            .values()
            .filter(|s| **s == JobStatus::Running)
            .count()
    }
}
