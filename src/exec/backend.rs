// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of spawning work
//! itself. This makes it easy to swap in a fake executor in tests while
//! keeping the production implementation here.
//!
//! - `RealExecutorBackend` spawns one Tokio task per dispatched unit; each
//!   reports back with a `UnitCompleted` event.
//! - Tests can provide their own `ExecutorBackend` that records which units
//!   were dispatched and emits `UnitCompleted` events directly.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::dag::ScheduledUnit;
use crate::engine::RuntimeEvent;
use crate::errors::Result;

use super::function::FunctionRegistry;
use super::unit_runner::{RunContext, run_unit};

/// Trait abstracting how scheduled units are executed.
///
/// The runtime never dispatches more units than its concurrency bound, so
/// implementations may run everything they receive at once.
pub trait ExecutorBackend: Send {
    /// Start executing the given units.
    ///
    /// Every unit must eventually produce exactly one
    /// `RuntimeEvent::UnitCompleted` on the runtime channel.
    fn spawn_ready_units(
        &mut self,
        units: Vec<ScheduledUnit>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
pub struct RealExecutorBackend {
    ctx: RunContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl RealExecutorBackend {
    pub fn new(
        registry: Arc<FunctionRegistry>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        base_dir: impl Into<PathBuf>,
        job_timeout: Option<Duration>,
    ) -> Self {
        Self {
            ctx: RunContext {
                registry,
                base_dir: base_dir.into(),
                job_timeout,
            },
            runtime_tx,
        }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_units(
        &mut self,
        units: Vec<ScheduledUnit>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for unit in units {
                tokio::spawn(run_unit(unit, self.ctx.clone(), self.runtime_tx.clone()));
            }
            Ok(())
        })
    }
}
