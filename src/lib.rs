pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod job;
pub mod logging;
pub mod types;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{default_spec_path, load_spec};
use crate::dag::{BuildPlan, DependencyGraph, FreshnessOracle, StagePlan};
use crate::engine::{BuildOptions, CoreRuntime, Runtime, RuntimeEvent, default_concurrency};
use crate::exec::{FunctionRegistry, RealExecutorBackend};
use crate::fs::{FileSystem, RealFileSystem};
use crate::job::{BuildResult, BuildSpec, JobStatus};
use crate::types::ScheduleMode;

/// Run one build to completion.
///
/// Configuration problems (cycles, unknown functions or targets, mixed
/// scheduling modes) are returned as errors before anything runs; job
/// failures are reported in the returned [`BuildResult`].
pub async fn build(
    spec: BuildSpec,
    registry: Arc<FunctionRegistry>,
    fs: Arc<dyn FileSystem>,
    options: BuildOptions,
) -> errors::Result<BuildResult> {
    drive(spec, registry, fs, options, false).await
}

async fn drive(
    spec: BuildSpec,
    registry: Arc<FunctionRegistry>,
    fs: Arc<dyn FileSystem>,
    options: BuildOptions,
    handle_ctrl_c: bool,
) -> errors::Result<BuildResult> {
    registry.validate(&spec)?;

    let oracle = FreshnessOracle::new(fs, &options.root, options.check);
    let plan = BuildPlan::prepare(spec, &oracle, &options.requested)?;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = RealExecutorBackend::new(
        registry,
        rt_tx.clone(),
        options.root.clone(),
        options.job_timeout,
    );

    if handle_ctrl_c {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let core = CoreRuntime::new(plan, options.max_concurrency);
    let mut runtime = Runtime::new(core, rt_rx, executor);
    if let Some(events) = options.events {
        runtime = runtime.with_observer(events);
    }
    runtime.run().await
}

/// High-level entry point used by `main.rs`.
///
/// Returns whether the build succeeded.
pub async fn run(args: CliArgs) -> Result<bool> {
    let cwd = std::env::current_dir()?;

    let files = if args.files.is_empty() {
        vec![default_spec_path(&cwd)?]
    } else {
        args.files.clone()
    };
    let defines: BTreeMap<String, String> = args.defines.iter().cloned().collect();

    let spec = load_spec(&files, &defines)?;
    info!(mode = %spec.mode(), jobs = spec.descriptors().len(), "build specification loaded");

    let registry = Arc::new(FunctionRegistry::with_builtins());
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let options = BuildOptions {
        max_concurrency: args
            .jobs
            .map(|j| j as usize)
            .unwrap_or_else(default_concurrency),
        check: args.check,
        requested: args.targets.clone(),
        root: cwd,
        job_timeout: args.timeout.map(Duration::from_secs),
        events: None,
    };

    if args.dry_run {
        registry.validate(&spec)?;
        print_dry_run(spec, fs, &options)?;
        return Ok(true);
    }

    let result = drive(spec, registry, fs, options, true).await?;
    print_report(&result);
    Ok(result.success)
}

/// Print what would run: graph targets in build order with their freshness,
/// or stages with their members.
fn print_dry_run(spec: BuildSpec, fs: Arc<dyn FileSystem>, options: &BuildOptions) -> Result<()> {
    println!("buildc dry-run ({} mode, check = {})", spec.mode(), options.check);

    match spec.mode() {
        ScheduleMode::Graph => {
            let (descriptors, _) = spec.into_parts();
            let mut graph = DependencyGraph::build(descriptors)?;
            let oracle = FreshnessOracle::new(fs, &options.root, options.check);
            graph.compute_freshness(&oracle)?;
            let closure = graph.closure_of(&options.requested)?;

            for target in graph.topological_targets()? {
                let Some(node) = graph.node(target) else {
                    continue;
                };
                let requested = options.requested.is_empty() || closure.contains(target);
                let marker = if requested { "" } else { " (not requested)" };
                match &node.work {
                    Some(work) => println!("  {target} [{:?}]{marker}: {work}", node.freshness),
                    None => println!("  {target} [{:?}]{marker}: <existing file>", node.freshness),
                }
                if !node.dependencies.is_empty() {
                    println!("      depends on: {}", node.dependencies.join(", "));
                }
            }
        }
        ScheduleMode::Stage => {
            let (descriptors, order) = spec.into_parts();
            let plan = StagePlan::group(descriptors, &order)?;
            for stage in plan.stages() {
                if stage.members.is_empty() {
                    continue;
                }
                println!("  stage {}:", stage.name);
                for member in &stage.members {
                    println!("    {}: {}", member.id, member.work);
                }
            }
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

fn print_report(result: &BuildResult) {
    let mut ran = 0;
    let mut fresh = 0;
    let mut failed = 0;

    println!();
    for (unit, status) in &result.statuses {
        let mark = match status {
            JobStatus::Succeeded => {
                ran += 1;
                "ok"
            }
            JobStatus::SucceededWithWarning(_) => {
                ran += 1;
                "warn"
            }
            JobStatus::SkippedFresh => {
                fresh += 1;
                "--"
            }
            JobStatus::SkippedNotRequested => continue,
            s if s.is_failure() => {
                failed += 1;
                "FAIL"
            }
            _ => "??",
        };
        println!("[{mark:>4}] {unit}: {status}");
    }

    let verdict = if result.success { "succeeded" } else { "FAILED" };
    println!("build {verdict}: {ran} ran, {fresh} up to date, {failed} failed");
}
