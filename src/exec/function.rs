// src/exec/function.rs

//! Registered build functions.
//!
//! Function jobs name a function instead of a program. The caller supplies
//! the name-to-callable mapping as a [`FunctionRegistry`]; every call runs on
//! Tokio's blocking pool so it can do synchronous IO without stalling the
//! runtime, and so a panic stays contained to that one job.
//!
//! Functions receive a [`FunctionContext`] carrying the build root. Path
//! arguments are resolved through it so they name the same files the
//! freshness checks stat.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::{BuildError, JobError, Result};
use crate::job::{BuildSpec, FunctionJob};

use super::builtins;

/// The build a function job runs in.
#[derive(Debug, Clone)]
pub struct FunctionContext {
    root: PathBuf,
}

impl FunctionContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `arg` as a path; relative paths resolve against the build root.
    pub fn resolve(&self, arg: &str) -> PathBuf {
        self.root.join(arg)
    }
}

/// A callable that can be invoked by name from a function job.
pub trait BuildFunction: Send + Sync {
    fn call(&self, cx: &FunctionContext, args: &[String]) -> anyhow::Result<()>;
}

impl<F> BuildFunction for F
where
    F: Fn(&FunctionContext, &[String]) -> anyhow::Result<()> + Send + Sync,
{
    fn call(&self, cx: &FunctionContext, args: &[String]) -> anyhow::Result<()> {
        self(cx, args)
    }
}

/// Name-to-function mapping handed to the executor.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn BuildFunction>>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with `touch`, `mkdir`, `copy`, `remove` and `echo`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register_all(&mut registry);
        registry
    }

    /// Register `function` under `name`, replacing any previous entry.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        function: impl BuildFunction + 'static,
    ) -> &mut Self {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn BuildFunction>> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Fail with [`BuildError::UnknownFunction`] if `spec` calls a function
    /// that is not registered.
    pub fn validate(&self, spec: &BuildSpec) -> Result<()> {
        for name in spec.function_names() {
            if !self.contains(name) {
                return Err(BuildError::UnknownFunction(name.to_string()));
            }
        }
        Ok(())
    }
}

/// Run one function job on the blocking pool, rooted at `root`.
pub async fn run_function(
    registry: &FunctionRegistry,
    job: &FunctionJob,
    root: &Path,
) -> std::result::Result<(), JobError> {
    let function = registry
        .get(&job.function)
        .ok_or_else(|| JobError::UnknownFunction(job.function.clone()))?;

    debug!(function = %job.function, args = ?job.args, "calling function");

    let cx = FunctionContext::new(root);
    let args = job.args.clone();
    let joined = tokio::task::spawn_blocking(move || function.call(&cx, &args)).await;

    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(JobError::FunctionFailed {
            name: job.function.clone(),
            source,
        }),
        Err(err) if err.is_panic() => Err(JobError::FunctionPanicked {
            name: job.function.clone(),
            message: panic_message(err.into_panic()),
        }),
        Err(err) => Err(JobError::Other(anyhow::anyhow!(
            "function '{}' was cancelled: {err}",
            job.function
        ))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
