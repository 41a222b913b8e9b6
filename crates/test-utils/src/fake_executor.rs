use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use buildc::dag::{BuildPlan, ScheduledUnit};
use buildc::engine::{BuildEvent, CoreRuntime, Runtime, RuntimeEvent, UnitOutcome};
use buildc::errors::Result;
use buildc::exec::ExecutorBackend;
use buildc::job::BuildResult;

#[derive(Debug, Default)]
struct LogState {
    executed: Vec<String>,
    running: usize,
    peak: usize,
}

/// What a [`FakeExecutor`] saw, shared with the test.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    state: Arc<Mutex<LogState>>,
}

impl ExecutionLog {
    /// Units in the order they were dispatched.
    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    /// Highest number of units in flight at once.
    pub fn peak_running(&self) -> usize {
        self.state.lock().unwrap().peak
    }

    /// Position of `unit` in the dispatch order.
    pub fn position(&self, unit: &str) -> Option<usize> {
        self.executed().iter().position(|u| u == unit)
    }
}

/// A fake executor that:
/// - records which units were dispatched, and how many were in flight
/// - reports each unit as succeeded after `delay`, unless told to fail or
///   warn for that unit.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    log: ExecutionLog,
    outcomes: HashMap<String, UnitOutcome>,
    delay: Duration,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            runtime_tx,
            log: ExecutionLog::default(),
            outcomes: HashMap::new(),
            delay: Duration::from_millis(1),
        }
    }

    pub fn log(&self) -> ExecutionLog {
        self.log.clone()
    }

    pub fn fail(mut self, unit: &str, error: &str) -> Self {
        self.outcomes
            .insert(unit.to_string(), UnitOutcome::Failed(error.to_string()));
        self
    }

    pub fn warn(mut self, unit: &str, warning: &str) -> Self {
        self.outcomes
            .insert(unit.to_string(), UnitOutcome::Warning(warning.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_units(
        &mut self,
        units: Vec<ScheduledUnit>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for unit in units {
                {
                    let mut state = self.log.state.lock().unwrap();
                    state.executed.push(unit.id.clone());
                    state.running += 1;
                    state.peak = state.peak.max(state.running);
                }

                let outcome = self
                    .outcomes
                    .get(&unit.id)
                    .cloned()
                    .unwrap_or(UnitOutcome::Success);
                let tx = self.runtime_tx.clone();
                let log = self.log.clone();
                let delay = self.delay;
                debug!(unit = %unit.id, ?outcome, "fake executor dispatch");

                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    log.state.lock().unwrap().running -= 1;
                    let _ = tx
                        .send(RuntimeEvent::UnitCompleted {
                            unit: unit.id,
                            outcome,
                        })
                        .await;
                });
            }
            Ok(())
        })
    }
}

/// Everything a fake build produced.
#[derive(Debug)]
pub struct FakeBuild {
    pub result: BuildResult,
    pub log: ExecutionLog,
    pub events: Vec<BuildEvent>,
}

/// Drive `plan` through the real runtime with a [`FakeExecutor`] configured
/// by `configure`.
pub async fn run_fake_build(
    plan: BuildPlan,
    max_concurrency: usize,
    configure: impl FnOnce(FakeExecutor) -> FakeExecutor,
) -> FakeBuild {
    let (tx, rx) = mpsc::channel(64);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let executor = configure(FakeExecutor::new(tx));
    let log = executor.log();

    let core = CoreRuntime::new(plan, max_concurrency);
    let runtime = Runtime::new(core, rx, executor).with_observer(events_tx);

    let result = crate::with_timeout(runtime.run())
        .await
        .expect("fake build failed");

    let mut events = Vec::new();
    while let Ok(event) = events_rx.try_recv() {
        events.push(event);
    }

    FakeBuild { result, log, events }
}
