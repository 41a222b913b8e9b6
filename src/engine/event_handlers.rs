// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info};

use crate::dag::{BuildPlan, ScheduledUnit, SchedulerStep};
use crate::engine::queue::ReadyQueue;
use crate::engine::{BuildEvent, UnitOutcome};
use crate::job::{JobStatus, UnitId};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these units to the executor.
    DispatchUnits(Vec<ScheduledUnit>),
    /// Every unit is terminal and nothing is running.
    Finish,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, Default)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Observable events produced by this step, in order.
    pub events: Vec<BuildEvent>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    /// Units dispatched by this step, in order.
    pub fn dispatched(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::DispatchUnits(units) => Some(units),
                CoreCommand::Finish => None,
            })
            .flatten()
            .map(|u| u.id.as_str())
            .collect()
    }
}

/// Handle the initial scheduler step of a build.
pub fn handle_build_start(
    plan: &mut BuildPlan,
    queue: &mut ReadyQueue,
    dispatch_order: &mut Vec<UnitId>,
) -> CoreStep {
    let step = plan.start();
    info!(
        ready = step.newly_ready.len(),
        resolved = step.resolved.len(),
        "build started"
    );

    let mut out = CoreStep::default();
    apply_scheduler_step(plan, queue, dispatch_order, step, &mut out);
    finish_step(plan, queue, out)
}

/// Handle a unit completion event.
pub fn handle_unit_completion(
    plan: &mut BuildPlan,
    queue: &mut ReadyQueue,
    dispatch_order: &mut Vec<UnitId>,
    unit: UnitId,
    outcome: UnitOutcome,
) -> CoreStep {
    let mut out = CoreStep::default();

    let Some(kind) = queue.finish(&unit) else {
        // Not one of ours; the queue already logged it.
        out.keep_running = !(plan.is_finished() && queue.is_idle());
        return out;
    };

    out.events.push(match &outcome {
        UnitOutcome::Success => BuildEvent::Succeeded {
            unit: unit.clone(),
            kind,
        },
        UnitOutcome::Warning(warning) => BuildEvent::Warned {
            unit: unit.clone(),
            kind,
            warning: warning.clone(),
        },
        UnitOutcome::Failed(error) => BuildEvent::Failed {
            unit: unit.clone(),
            kind: Some(kind),
            error: error.clone(),
        },
    });

    let step = plan.complete(&unit, outcome);
    apply_scheduler_step(plan, queue, dispatch_order, step, &mut out);
    finish_step(plan, queue, out)
}

/// Turn a scheduler step into events and dispatch commands.
///
/// Newly ready units join the ready queue; whatever fits under the
/// concurrency bound is marked running and dispatched.
fn apply_scheduler_step(
    plan: &mut BuildPlan,
    queue: &mut ReadyQueue,
    dispatch_order: &mut Vec<UnitId>,
    step: SchedulerStep,
    out: &mut CoreStep,
) {
    for (unit, status) in step.resolved {
        out.events.push(match status {
            JobStatus::Failed(error) => BuildEvent::Failed {
                unit,
                kind: None,
                error,
            },
            status => BuildEvent::Skipped { unit, status },
        });
    }

    queue.push_all(step.newly_ready);

    let batch = queue.take_dispatchable();
    if batch.is_empty() {
        return;
    }

    for unit in &batch {
        plan.mark_running(&unit.id);
        dispatch_order.push(unit.id.clone());
        out.events.push(BuildEvent::Started {
            unit: unit.id.clone(),
            kind: unit.kind(),
        });
    }
    debug!(units = ?batch.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(), "dispatch");
    out.commands.push(CoreCommand::DispatchUnits(batch));
}

fn finish_step(plan: &BuildPlan, queue: &ReadyQueue, mut out: CoreStep) -> CoreStep {
    if plan.is_finished() && queue.is_idle() {
        out.commands.push(CoreCommand::Finish);
        out.keep_running = false;
    } else {
        out.keep_running = true;
    }
    out
}
