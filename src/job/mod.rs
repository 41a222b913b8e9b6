// src/job/mod.rs

//! Job model.
//!
//! - [`Job`] is the atomic unit of work: a registered function call or an
//!   external program.
//! - [`Work`] is what the scheduler dispatches as one unit: a single job or a
//!   [`TaskSequence`] run in order on one worker.
//! - [`descriptor`] attaches scheduling information (target/dependencies or
//!   stage) to a piece of work and assembles a [`BuildSpec`].
//! - [`status`] holds per-unit statuses and the aggregated [`BuildResult`].

pub mod descriptor;
pub mod status;

use std::fmt;
use std::path::PathBuf;

pub use descriptor::{BuildSpec, JobDescriptor, Placement};
pub use status::{BuildResult, JobStatus};

/// Identifier of a schedulable unit: the target in graph mode,
/// `<stage>:<index>` in stage mode.
pub type UnitId = String;

/// Invocation of a function looked up by name in the
/// [`FunctionRegistry`](crate::exec::FunctionRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionJob {
    pub function: String,
    pub args: Vec<String>,
}

/// Invocation of an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellJob {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; `None` inherits the build process's directory.
    pub working_dir: Option<PathBuf>,
    /// Echo the command line and forward the child's output to stdout.
    pub display_output: bool,
    /// Treat a non-zero exit status as success with a warning.
    pub ignore_failure: bool,
}

impl ShellJob {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
            display_output: false,
            ignore_failure: false,
        }
    }

    /// Program and arguments joined by spaces, for display and logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Function(FunctionJob),
    Shell(ShellJob),
}

impl Job {
    pub fn function(name: impl Into<String>, args: Vec<String>) -> Self {
        Job::Function(FunctionJob {
            function: name.into(),
            args,
        })
    }

    pub fn shell(program: impl Into<String>, args: Vec<String>) -> Self {
        Job::Shell(ShellJob::new(program, args))
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Job::Function(_) => JobKind::Function,
            Job::Shell(_) => JobKind::Shell,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Function(job) => write!(f, "{}({})", job.function, job.args.join(", ")),
            Job::Shell(job) => f.write_str(&job.command_line()),
        }
    }
}

/// Kind of a dispatched unit, as reported in events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Function,
    Shell,
    Sequence,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Function => f.write_str("function"),
            JobKind::Shell => f.write_str("shell"),
            JobKind::Sequence => f.write_str("sequence"),
        }
    }
}

/// Jobs that must run strictly in order as one schedulable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSequence {
    pub jobs: Vec<Job>,
}

/// The body of a schedulable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Work {
    Single(Job),
    Sequence(TaskSequence),
}

impl Work {
    /// Jobs in execution order.
    pub fn jobs(&self) -> &[Job] {
        match self {
            Work::Single(job) => std::slice::from_ref(job),
            Work::Sequence(seq) => &seq.jobs,
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Work::Single(job) => job.kind(),
            Work::Sequence(_) => JobKind::Sequence,
        }
    }

    /// Names of every function this work calls.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.jobs().iter().filter_map(|job| match job {
            Job::Function(f) => Some(f.function.as_str()),
            Job::Shell(_) => None,
        })
    }
}

impl From<Job> for Work {
    fn from(job: Job) -> Self {
        Work::Single(job)
    }
}

impl fmt::Display for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Work::Single(job) => job.fmt(f),
            Work::Sequence(seq) => {
                let parts: Vec<String> = seq.jobs.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join("; "))
            }
        }
    }
}
