// src/engine/queue.rs

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use crate::dag::ScheduledUnit;
use crate::job::{JobKind, UnitId};

/// Queue of ready units in front of a bounded pool of workers.
///
/// Semantics:
/// - Schedulers may release any number of ready units at once; they wait
///   here in FIFO order.
/// - At most `max_running` units are out on workers at any time.
/// - A slot is freed when the runtime reports the unit's completion.
#[derive(Debug)]
pub struct ReadyQueue {
    waiting: VecDeque<ScheduledUnit>,
    running: HashMap<UnitId, JobKind>,
    max_running: usize,
    peak_running: usize,
}

impl ReadyQueue {
    pub fn new(max_running: usize) -> Self {
        Self {
            waiting: VecDeque::new(),
            running: HashMap::new(),
            max_running: max_running.max(1),
            peak_running: 0,
        }
    }

    pub fn push_all(&mut self, units: impl IntoIterator<Item = ScheduledUnit>) {
        self.waiting.extend(units);
    }

    /// Pop as many waiting units as there are free slots and mark them
    /// running.
    pub fn take_dispatchable(&mut self) -> Vec<ScheduledUnit> {
        let mut batch = Vec::new();
        while self.running.len() < self.max_running {
            let Some(unit) = self.waiting.pop_front() else {
                break;
            };
            self.running.insert(unit.id.clone(), unit.kind());
            batch.push(unit);
        }
        self.peak_running = self.peak_running.max(self.running.len());

        if !batch.is_empty() {
            debug!(
                dispatched = batch.len(),
                running = self.running.len(),
                waiting = self.waiting.len(),
                "dispatching from ready queue"
            );
        }
        batch
    }

    /// Free the slot held by `unit`; returns its kind if it was running.
    pub fn finish(&mut self, unit: &str) -> Option<JobKind> {
        let kind = self.running.remove(unit);
        if kind.is_none() {
            warn!(unit = %unit, "completion for a unit that is not running");
        }
        kind
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// Highest number of simultaneously running units seen so far.
    pub fn peak_running(&self) -> usize {
        self.peak_running
    }

    pub fn is_idle(&self) -> bool {
        self.waiting.is_empty() && self.running.is_empty()
    }

    /// Drop every waiting unit (used on shutdown); running units are left
    /// to finish.
    pub fn clear_waiting(&mut self) -> Vec<ScheduledUnit> {
        self.waiting.drain(..).collect()
    }
}
