use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// How the freshness oracle decides whether a target must be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMethod {
    /// Make-style modification-time comparison (default).
    Mtime,
    /// Every target that has a job is rebuilt.
    Force,
    /// Dependencies are ignored; a target is rebuilt only when its artifact
    /// is missing.
    Ignore,
}

impl Default for CheckMethod {
    fn default() -> Self {
        CheckMethod::Mtime
    }
}

impl FromStr for CheckMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mtime" => Ok(CheckMethod::Mtime),
            "force" => Ok(CheckMethod::Force),
            "ignore" => Ok(CheckMethod::Ignore),
            other => Err(format!(
                "invalid check method: {other} (expected \"mtime\", \"force\" or \"ignore\")"
            )),
        }
    }
}

impl fmt::Display for CheckMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckMethod::Mtime => f.write_str("mtime"),
            CheckMethod::Force => f.write_str("force"),
            CheckMethod::Ignore => f.write_str("ignore"),
        }
    }
}

/// Which scheduling strategy a build uses.
///
/// Resolved once from the shape of the descriptors: any target-bearing
/// descriptor selects `Graph`, otherwise `Stage`. The two are never mixed
/// within one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    Graph,
    Stage,
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleMode::Graph => f.write_str("graph"),
            ScheduleMode::Stage => f.write_str("stage"),
        }
    }
}
