// src/exec/mod.rs

//! Job execution layer.
//!
//! This module actually runs the work of dispatched units and reports back
//! to the orchestration runtime via `RuntimeEvent`s.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and the concrete
//!   `RealExecutorBackend` used in production, which tests can replace with
//!   a fake implementation.
//! - [`unit_runner`] runs one unit's jobs in order and reports the outcome.
//! - [`shell`] runs external programs with `tokio::process`.
//! - [`function`] holds the function registry and runs function jobs.
//! - [`builtins`] are the functions available to every build file.

pub mod backend;
pub mod builtins;
pub mod function;
pub mod shell;
pub mod unit_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use function::{BuildFunction, FunctionContext, FunctionRegistry};
pub use unit_runner::{RunContext, execute_unit};
