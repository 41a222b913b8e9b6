// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::ScheduledUnit;
use crate::errors::{BuildError, Result};
use crate::exec::ExecutorBackend;
use crate::job::BuildResult;

use super::core::CoreRuntime;
use super::{BuildEvent, CoreCommand, CoreStep, RuntimeEvent};

/// Drives a build in response to `RuntimeEvent`s and delegates the actual
/// work to an `ExecutorBackend`.
///
/// This is an IO shell around `CoreRuntime`, which contains all the
/// scheduling semantics. This struct reads completion events from the
/// channel, hands units to the executor and publishes `BuildEvent`s.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    observer: Option<mpsc::UnboundedSender<BuildEvent>>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            observer: None,
        }
    }

    /// Also forward every `BuildEvent` to `observer`.
    pub fn with_observer(mut self, observer: mpsc::UnboundedSender<BuildEvent>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Main event loop.
    ///
    /// - Starts the build in the core and dispatches the first units.
    /// - Consumes `RuntimeEvent`s from `event_rx` and feeds them into the core.
    /// - Executes commands returned by the core until it reports completion.
    pub async fn run(mut self) -> Result<BuildResult> {
        info!("buildc runtime started");

        let step = self.core.start();
        let mut keep_running = self.apply(step).await?;

        while keep_running {
            let Some(event) = self.event_rx.recv().await else {
                let running = self.core.running_count();
                error!(running, "runtime event channel closed before the build finished");
                return Err(BuildError::Executor(format!(
                    "event channel closed with {running} unit(s) still running"
                )));
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            keep_running = self.apply(step).await?;
        }

        let result = self.core.into_result();
        info!(success = result.success, "runtime exiting");
        Ok(result)
    }

    /// Publish the step's events, then execute its commands.
    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        for event in step.events {
            self.publish(event);
        }

        for command in step.commands {
            match command {
                CoreCommand::DispatchUnits(units) => self.spawn_ready(units).await?,
                CoreCommand::Finish => info!("all units finished"),
            }
        }

        Ok(step.keep_running)
    }

    fn publish(&self, event: BuildEvent) {
        match &event {
            BuildEvent::Started { unit, kind } => info!(unit = %unit, %kind, "started"),
            BuildEvent::Succeeded { unit, kind } => info!(unit = %unit, %kind, "succeeded"),
            BuildEvent::Warned {
                unit,
                kind,
                warning,
            } => warn!(unit = %unit, %kind, %warning, "succeeded with warning"),
            BuildEvent::Failed { unit, kind, error } => match kind {
                Some(kind) => error!(unit = %unit, %kind, %error, "failed"),
                None => error!(unit = %unit, %error, "failed before dispatch"),
            },
            BuildEvent::Skipped { unit, status } => debug!(unit = %unit, %status, "skipped"),
        }

        if let Some(observer) = &self.observer {
            // A dropped observer only loses the event stream.
            let _ = observer.send(event);
        }
    }

    async fn spawn_ready(&mut self, units: Vec<ScheduledUnit>) -> Result<()> {
        if units.is_empty() {
            return Ok(());
        }

        let ids: Vec<_> = units.iter().map(|u| u.id.as_str()).collect();
        debug!(?ids, "spawning ready units");

        self.executor.spawn_ready_units(units).await
    }
}
