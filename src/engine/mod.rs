// src/engine/mod.rs

//! Orchestration engine for buildc.
//!
//! This module ties together:
//! - the build plan (graph or stage scheduler)
//! - the ready queue that enforces the concurrency bound
//! - the main runtime event loop that reacts to unit completions
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::job::{JobKind, JobStatus, UnitId};
use crate::types::CheckMethod;

/// Outcome of a unit's work, as reported by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Success,
    /// Succeeded, but a job tolerated its own failure.
    Warning(String),
    Failed(String),
}

impl UnitOutcome {
    pub fn into_status(self) -> JobStatus {
        match self {
            UnitOutcome::Success => JobStatus::Succeeded,
            UnitOutcome::Warning(w) => JobStatus::SucceededWithWarning(w),
            UnitOutcome::Failed(e) => JobStatus::Failed(e),
        }
    }
}

/// Events flowing into the runtime from the executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A unit's work finished with a concrete outcome.
    UnitCompleted { unit: UnitId, outcome: UnitOutcome },
    /// Stop dispatching and return (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Observable per-unit events, for logging and reporting collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    Started { unit: UnitId, kind: JobKind },
    Succeeded { unit: UnitId, kind: JobKind },
    /// Succeeded after a tolerated failure.
    Warned {
        unit: UnitId,
        kind: JobKind,
        warning: String,
    },
    /// Failed while running, or before dispatch (e.g. a freshness check).
    Failed {
        unit: UnitId,
        kind: Option<JobKind>,
        error: String,
    },
    Skipped { unit: UnitId, status: JobStatus },
}

/// Options for one build invocation.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Maximum number of units running at once (at least 1).
    pub max_concurrency: usize,
    pub check: CheckMethod,
    /// Targets (graph mode) or stages (stage mode) to build; empty = all.
    pub requested: Vec<String>,
    /// Directory artifact identifiers are resolved against.
    pub root: PathBuf,
    /// Per-job timeout; `None` waits forever.
    pub job_timeout: Option<Duration>,
    /// Receives every `BuildEvent` as it happens.
    pub events: Option<mpsc::UnboundedSender<BuildEvent>>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_concurrency: default_concurrency(),
            check: CheckMethod::default(),
            requested: Vec::new(),
            root: PathBuf::from("."),
            job_timeout: None,
            events: None,
        }
    }
}

/// Available parallelism of the host, or 1 when it cannot be determined.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::ReadyQueue;
pub use runtime::Runtime;
