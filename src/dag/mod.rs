// src/dag/mod.rs

//! Dependency analysis and scheduling.
//!
//! - [`freshness`] decides whether targets are stale (Make semantics).
//! - [`graph`] builds the target graph and rejects cycles.
//! - [`stages`] groups stage jobs into an ordered [`StagePlan`].
//! - [`scheduler`] and [`stage_scheduler`] are the per-build state machines
//!   that decide which units are ready and how failures propagate.
//! - [`plan`] selects one of them for a build.
//! - [`state_manager`] holds graph status transitions.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`unit`] is what gets handed to the executor.

pub mod freshness;
pub mod graph;
pub mod plan;
pub mod scheduler;
pub mod scheduler_step;
pub mod stage_scheduler;
pub mod stages;
pub mod state_manager;
pub mod unit;

pub use freshness::{Freshness, FreshnessOracle};
pub use graph::{DependencyGraph, GraphNode};
pub use plan::BuildPlan;
pub use scheduler::GraphScheduler;
pub use scheduler_step::SchedulerStep;
pub use stage_scheduler::StageScheduler;
pub use stages::{DEFAULT_STAGE, Stage, StageMember, StagePlan};
pub use unit::ScheduledUnit;
