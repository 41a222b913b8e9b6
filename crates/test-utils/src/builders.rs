#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use buildc::dag::{BuildPlan, FreshnessOracle};
use buildc::errors::Result;
use buildc::fs::mock::MockFileSystem;
use buildc::job::{BuildSpec, Job, JobDescriptor, TaskSequence, Work};
use buildc::types::CheckMethod;

/// Function job calling `name` with no arguments.
pub fn func(name: &str) -> Job {
    Job::function(name, Vec::new())
}

/// Shell job from a whitespace-separated command line.
pub fn sh(command_line: &str) -> Job {
    let mut words = command_line.split_whitespace().map(str::to_string);
    let program = words.next().unwrap_or_default();
    Job::shell(program, words.collect())
}

pub fn sequence(jobs: Vec<Job>) -> Work {
    Work::Sequence(TaskSequence { jobs })
}

/// Builder for `BuildSpec` to simplify test setup.
///
/// Jobs added without explicit work call the function `noop`.
#[derive(Debug, Default)]
pub struct SpecBuilder {
    descriptors: Vec<JobDescriptor>,
    stages: Vec<String>,
}

impl SpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(self, name: &str, deps: &[&str]) -> Self {
        self.target_with(func("noop"), name, deps)
    }

    pub fn target_with(mut self, work: impl Into<Work>, name: &str, deps: &[&str]) -> Self {
        self.descriptors.push(JobDescriptor::target(
            work,
            name,
            deps.iter().map(|d| d.to_string()).collect(),
        ));
        self
    }

    /// Stage job; `None` puts it in the default stage.
    pub fn stage_job(self, stage: Option<&str>) -> Self {
        self.stage_job_with(func("noop"), stage)
    }

    pub fn stage_job_with(mut self, work: impl Into<Work>, stage: Option<&str>) -> Self {
        self.descriptors
            .push(JobDescriptor::stage(work, stage.map(str::to_string)));
        self
    }

    pub fn declare_stages(mut self, stages: &[&str]) -> Self {
        self.stages.extend(stages.iter().map(|s| s.to_string()));
        self
    }

    pub fn try_build(self) -> Result<BuildSpec> {
        BuildSpec::new(self.descriptors, self.stages)
    }

    pub fn build(self) -> BuildSpec {
        self.try_build()
            .expect("Failed to build valid spec from builder")
    }
}

/// Prepare a plan against an in-memory filesystem rooted at the empty path,
/// so artifact `a.o` lives at mock path `a.o`.
pub fn plan_with(
    spec: BuildSpec,
    fs: &MockFileSystem,
    check: CheckMethod,
    requested: &[&str],
) -> Result<BuildPlan> {
    let oracle = FreshnessOracle::new(Arc::new(fs.clone()), PathBuf::new(), check);
    let requested: Vec<String> = requested.iter().map(|s| s.to_string()).collect();
    BuildPlan::prepare(spec, &oracle, &requested)
}

/// Plan with an empty filesystem, mtime checks and everything requested.
pub fn plan(spec: BuildSpec) -> BuildPlan {
    plan_with(spec, &MockFileSystem::new(), CheckMethod::Mtime, &[])
        .expect("Failed to prepare plan")
}
