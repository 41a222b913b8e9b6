// src/dag/freshness.rs

//! Make-style staleness decisions based on artifact modification times.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, trace};

use crate::errors::{BuildError, Result};
use crate::fs::FileSystem;
use crate::types::CheckMethod;

/// Freshness of a graph node, computed once before scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    Unknown,
    Fresh,
    Stale,
    /// Stat-ing the artifact (or one of its inputs) failed.
    Error(String),
}

/// Decides whether targets must be rebuilt.
///
/// Artifact identifiers are resolved relative to `root`.
#[derive(Debug, Clone)]
pub struct FreshnessOracle {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    method: CheckMethod,
}

impl FreshnessOracle {
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>, method: CheckMethod) -> Self {
        Self {
            fs,
            root: root.into(),
            method,
        }
    }

    pub fn method(&self) -> CheckMethod {
        self.method
    }

    pub fn artifact_path(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Modification time of the artifact named `id`, `None` when absent.
    pub fn modified(&self, id: &str) -> Result<Option<SystemTime>> {
        let path = self.artifact_path(id);
        self.stat(&path)
    }

    fn stat(&self, path: &Path) -> Result<Option<SystemTime>> {
        self.fs
            .modified(path)
            .map_err(|source| BuildError::FreshnessCheck {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Whether `target` must be rebuilt given its direct `dependencies`.
    ///
    /// Transitive staleness (a dependency that will itself be rebuilt) is
    /// applied by [`DependencyGraph::compute_freshness`](super::DependencyGraph::compute_freshness).
    pub fn is_stale(&self, target: &str, dependencies: &[String]) -> Result<bool> {
        if self.method == CheckMethod::Force {
            trace!(target = %target, "check method is force; target is stale");
            return Ok(true);
        }

        let target_time = self.modified(target)?;

        // Stat every dependency before deciding so an IO error is never
        // hidden behind an earlier missing input.
        let dep_times = if self.method == CheckMethod::Mtime {
            dependencies
                .iter()
                .map(|dep| self.modified(dep).map(|t| (dep, t)))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        let Some(target_time) = target_time else {
            debug!(target = %target, "artifact missing; target is stale");
            return Ok(true);
        };

        for (dep, dep_time) in dep_times {
            match dep_time {
                None => {
                    debug!(target = %target, dep = %dep, "dependency missing; target is stale");
                    return Ok(true);
                }
                Some(t) if t > target_time => {
                    debug!(target = %target, dep = %dep, "dependency newer than target; target is stale");
                    return Ok(true);
                }
                Some(_) => {}
            }
        }

        trace!(target = %target, "target is fresh");
        Ok(false)
    }
}
