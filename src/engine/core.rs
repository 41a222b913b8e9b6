// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of commands describing what the IO shell should do next
//! - the [`BuildEvent`](crate::engine::BuildEvent)s observers should see
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels, handing units to the executor and handling
//! shutdown. The core can be driven directly in tests without Tokio,
//! processes or a filesystem.

use tracing::info;

use crate::dag::BuildPlan;
use crate::engine::event_handlers::{CoreStep, handle_build_start, handle_unit_completion};
use crate::engine::queue::ReadyQueue;
use crate::engine::RuntimeEvent;
use crate::job::{BuildResult, UnitId};

/// Pure core runtime state.
///
/// Owns the build plan, the ready queue and the dispatch record. It has no
/// channels or Tokio types and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    plan: BuildPlan,
    queue: ReadyQueue,
    dispatch_order: Vec<UnitId>,
}

impl CoreRuntime {
    pub fn new(plan: BuildPlan, max_concurrency: usize) -> Self {
        Self {
            plan,
            queue: ReadyQueue::new(max_concurrency),
            dispatch_order: Vec::new(),
        }
    }

    /// Resolve everything that needs no work and dispatch the first units.
    pub fn start(&mut self) -> CoreStep {
        handle_build_start(&mut self.plan, &mut self.queue, &mut self.dispatch_order)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::UnitCompleted { unit, outcome } => handle_unit_completion(
                &mut self.plan,
                &mut self.queue,
                &mut self.dispatch_order,
                unit,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => {
                let dropped = self.queue.clear_waiting();
                info!(
                    dropped = dropped.len(),
                    running = self.queue.running_count(),
                    "shutdown requested"
                );
                CoreStep {
                    keep_running: false,
                    ..CoreStep::default()
                }
            }
        }
    }

    pub fn plan(&self) -> &BuildPlan {
        &self.plan
    }

    pub fn is_finished(&self) -> bool {
        self.plan.is_finished() && self.queue.is_idle()
    }

    pub fn running_count(&self) -> usize {
        self.queue.running_count()
    }

    pub fn peak_running(&self) -> usize {
        self.queue.peak_running()
    }

    pub fn into_result(self) -> BuildResult {
        BuildResult::new(self.plan.mode(), self.plan.statuses(), self.dispatch_order)
    }
}
