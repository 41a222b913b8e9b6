// src/exec/unit_runner.rs

//! Runs the work of one scheduled unit and reports its outcome.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::dag::ScheduledUnit;
use crate::engine::{RuntimeEvent, UnitOutcome};
use crate::errors::JobError;
use crate::job::Job;

use super::function::{FunctionRegistry, run_function};
use super::shell::run_shell;

/// Everything a worker needs besides the unit itself.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub registry: Arc<FunctionRegistry>,
    pub base_dir: PathBuf,
    pub job_timeout: Option<Duration>,
}

/// Run every job of `unit` and send exactly one `UnitCompleted` event.
pub async fn run_unit(unit: ScheduledUnit, ctx: RunContext, runtime_tx: mpsc::Sender<RuntimeEvent>) {
    let outcome = execute_unit(&unit, &ctx).await;
    debug!(unit = %unit.id, ?outcome, "unit finished");

    if runtime_tx
        .send(RuntimeEvent::UnitCompleted {
            unit: unit.id.clone(),
            outcome,
        })
        .await
        .is_err()
    {
        error!(unit = %unit.id, "runtime dropped before unit completion could be reported");
    }
}

/// Run the unit's jobs in order.
///
/// The first failing job ends the unit; tolerated failures are collected
/// and reported together as the unit's warning.
pub async fn execute_unit(unit: &ScheduledUnit, ctx: &RunContext) -> UnitOutcome {
    let mut warnings = Vec::new();

    for (index, job) in unit.work.jobs().iter().enumerate() {
        match run_job(&unit.id, job, ctx).await {
            Ok(None) => {}
            Ok(Some(warning)) => {
                warn!(unit = %unit.id, job = index, %warning, "tolerated job failure");
                warnings.push(warning);
            }
            Err(err) => {
                return UnitOutcome::Failed(if unit.work.jobs().len() > 1 {
                    format!("job {} ({job}): {err}", index + 1)
                } else {
                    err.to_string()
                });
            }
        }
    }

    if warnings.is_empty() {
        UnitOutcome::Success
    } else {
        UnitOutcome::Warning(warnings.join("; "))
    }
}

async fn run_job(unit: &str, job: &Job, ctx: &RunContext) -> Result<Option<String>, JobError> {
    let fut = async {
        match job {
            Job::Function(f) => run_function(&ctx.registry, f, &ctx.base_dir)
                .await
                .map(|()| None),
            Job::Shell(s) => run_shell(unit, s, &ctx.base_dir).await,
        }
    };

    match ctx.job_timeout {
        Some(timeout) => tokio::time::timeout(timeout, fut)
            .await
            .unwrap_or_else(|_| {
                Err(JobError::TimedOut {
                    command: job.to_string(),
                    timeout,
                })
            }),
        None => fut.await,
    }
}
