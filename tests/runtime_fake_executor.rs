// tests/runtime_fake_executor.rs

mod common;
use crate::common::builders::{SpecBuilder, plan, plan_with};
use crate::common::fake_executor::run_fake_build;
use crate::common::init_tracing;

use std::io;
use std::time::Duration;

use buildc::engine::BuildEvent;
use buildc::fs::mock::MockFileSystem;
use buildc::job::{JobKind, JobStatus};
use buildc::types::CheckMethod;

#[tokio::test]
async fn chain_runs_in_dependency_order() {
    init_tracing();

    let spec = SpecBuilder::new()
        .target("C", &["B"])
        .target("B", &["A"])
        .target("A", &[])
        .build();

    let build = run_fake_build(plan(spec), 4, |e| e).await;

    assert_eq!(build.log.executed(), vec!["A", "B", "C"]);
    assert_eq!(build.result.dispatch_order, vec!["A", "B", "C"]);
    assert!(build.result.success);
    assert_eq!(build.result.succeeded().count(), 3);
}

#[tokio::test]
async fn diamond_waits_for_both_branches() {
    init_tracing();

    let spec = SpecBuilder::new()
        .target("top", &["left", "right"])
        .target("left", &["base"])
        .target("right", &["base"])
        .target("base", &[])
        .build();

    let build = run_fake_build(plan(spec), 4, |e| e).await;
    let log = build.log;

    let pos = |u: &str| log.position(u).unwrap();
    assert_eq!(pos("base"), 0);
    assert!(pos("left") < pos("top"));
    assert!(pos("right") < pos("top"));
    assert!(build.result.success);
}

#[tokio::test]
async fn failure_skips_dependents_and_fails_the_build() {
    init_tracing();

    // A -> B -> C, plus independent D.
    let spec = SpecBuilder::new()
        .target("A", &[])
        .target("B", &["A"])
        .target("C", &["B"])
        .target("D", &[])
        .build();

    let build = run_fake_build(plan(spec), 4, |e| e.fail("A", "exit status 2")).await;
    let result = build.result;

    assert!(!result.success);
    assert_eq!(result.status("A"), Some(&JobStatus::Failed("exit status 2".into())));
    assert_eq!(
        result.status("B"),
        Some(&JobStatus::SkippedUpstreamFailed("A".into()))
    );
    assert_eq!(
        result.status("C"),
        Some(&JobStatus::SkippedUpstreamFailed("A".into()))
    );
    assert_eq!(result.status("D"), Some(&JobStatus::Succeeded));

    let executed = build.log.executed();
    assert!(!executed.contains(&"B".to_string()));
    assert!(!executed.contains(&"C".to_string()));
}

#[tokio::test]
async fn partial_build_dispatches_exactly_the_closure() {
    init_tracing();

    let spec = SpecBuilder::new()
        .target("T1", &[])
        .target("T2", &["T1"])
        .target("T3", &["T2"])
        .target("T4", &[])
        .target("T5", &["T3", "T4"])
        .build();
    let p = plan_with(spec, &MockFileSystem::new(), CheckMethod::Mtime, &["T3"]).unwrap();

    let build = run_fake_build(p, 4, |e| e).await;

    assert_eq!(build.log.executed(), vec!["T1", "T2", "T3"]);
    assert!(build.result.success, "not-requested units do not fail the build");
    assert_eq!(
        build.result.status("T5"),
        Some(&JobStatus::SkippedNotRequested)
    );
}

#[tokio::test]
async fn concurrency_never_exceeds_the_bound() {
    init_tracing();

    let mut builder = SpecBuilder::new();
    for i in 0..12 {
        builder = builder.target(&format!("t{i}"), &[]);
    }
    let spec = builder.target("all", &["t0", "t5", "t11"]).build();

    let build = run_fake_build(plan(spec), 3, |e| e.with_delay(Duration::from_millis(5))).await;

    assert_eq!(build.log.executed().len(), 13);
    assert!(build.log.peak_running() <= 3, "peak was {}", build.log.peak_running());
    assert!(build.log.peak_running() >= 2, "independent targets should overlap");
    assert!(build.result.success);
}

#[tokio::test]
async fn bound_of_one_serialises_everything() {
    init_tracing();

    let spec = SpecBuilder::new()
        .stage_job(Some("s"))
        .stage_job(Some("s"))
        .stage_job(Some("s"))
        .build();

    let build = run_fake_build(plan(spec), 1, |e| e.with_delay(Duration::from_millis(2))).await;

    assert_eq!(build.log.peak_running(), 1);
    assert_eq!(build.log.executed(), vec!["s:0", "s:1", "s:2"]);
}

#[tokio::test]
async fn stages_run_in_order_and_halt_after_a_failure() {
    init_tracing();

    let spec = SpecBuilder::new()
        .stage_job(Some("build"))
        .stage_job(Some("build"))
        .stage_job(Some("test"))
        .stage_job(Some("deploy"))
        .build();

    let build = run_fake_build(plan(spec), 4, |e| e.fail("build:0", "compile error")).await;
    let result = build.result;

    let mut executed = build.log.executed();
    executed.sort();
    assert_eq!(executed, vec!["build:0", "build:1"], "current stage drains");
    assert!(!result.success);
    assert_eq!(result.status("build:1"), Some(&JobStatus::Succeeded));
    assert_eq!(result.status("test:0"), Some(&JobStatus::SkippedStageHalted));
    assert_eq!(result.status("deploy:0"), Some(&JobStatus::SkippedStageHalted));
}

#[tokio::test]
async fn every_stage_member_finishes_before_the_next_stage_starts() {
    init_tracing();

    let spec = SpecBuilder::new()
        .stage_job(Some("one"))
        .stage_job(Some("one"))
        .stage_job(Some("one"))
        .stage_job(Some("two"))
        .stage_job(None)
        .build();

    let build = run_fake_build(plan(spec), 8, |e| e.with_delay(Duration::from_millis(3))).await;
    let log = build.log;

    assert_eq!(log.position("_default:0"), Some(0));
    let last_of_one = ["one:0", "one:1", "one:2"]
        .iter()
        .map(|u| log.position(u).unwrap())
        .max()
        .unwrap();
    assert!(last_of_one < log.position("two:0").unwrap());
    assert!(build.result.success);
}

#[tokio::test]
async fn tolerated_failure_is_a_warning_and_unblocks_dependents() {
    init_tracing();

    let spec = SpecBuilder::new()
        .target("lint", &[])
        .target("package", &["lint"])
        .build();

    let build = run_fake_build(plan(spec), 2, |e| e.warn("lint", "exit status 1 ignored")).await;
    let result = build.result;

    assert!(result.success);
    assert_eq!(
        result.status("lint"),
        Some(&JobStatus::SucceededWithWarning("exit status 1 ignored".into()))
    );
    assert_eq!(result.status("package"), Some(&JobStatus::Succeeded));
    assert_eq!(result.warnings().collect::<Vec<_>>(), vec![("lint", "exit status 1 ignored")]);
}

#[tokio::test]
async fn fresh_targets_are_not_dispatched() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("main.c");
    fs.add_file("main.o");
    fs.add_file("app");
    fs.touch("main.c"); // edited after the last build

    let spec = SpecBuilder::new()
        .target("main.o", &["main.c"])
        .target("app", &["main.o"])
        .target("docs", &[])
        .build();

    // Up to date apart from main.c; docs has no artifact yet.
    let p = plan_with(spec.clone(), &fs, CheckMethod::Mtime, &[]).unwrap();
    let build = run_fake_build(p, 2, |e| e).await;
    let mut executed = build.log.executed();
    executed.sort();
    assert_eq!(executed, vec!["app", "docs", "main.o"]);

    // Once everything exists and is newer than its inputs, nothing runs.
    fs.touch("main.o");
    fs.touch("app");
    fs.touch("docs");
    let p = plan_with(spec.clone(), &fs, CheckMethod::Mtime, &[]).unwrap();
    let build = run_fake_build(p, 2, |e| e).await;
    assert!(build.log.executed().is_empty());
    assert!(build.result.success);
    assert_eq!(build.result.status("app"), Some(&JobStatus::SkippedFresh));

    // Forcing rebuilds every target that has a job.
    let p = plan_with(spec, &fs, CheckMethod::Force, &[]).unwrap();
    let build = run_fake_build(p, 2, |e| e).await;
    assert_eq!(build.log.executed().len(), 3);
}

#[tokio::test]
async fn stat_failure_fails_one_target_and_spares_unrelated_ones() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_unreadable("a", io::ErrorKind::PermissionDenied);

    // a <- b, and an independent c.
    let spec = SpecBuilder::new()
        .target("a", &[])
        .target("b", &["a"])
        .target("c", &[])
        .build();

    let p = plan_with(spec, &fs, CheckMethod::Mtime, &[]).unwrap();
    let build = run_fake_build(p, 2, |e| e).await;

    assert_eq!(build.log.executed(), vec!["c"]);
    assert!(!build.result.success);
    assert!(matches!(
        build.result.status("a"),
        Some(JobStatus::Failed(msg)) if msg.contains("Freshness check failed")
    ));
    assert_eq!(
        build.result.status("b"),
        Some(&JobStatus::SkippedUpstreamFailed("a".into()))
    );
    assert_eq!(build.result.status("c"), Some(&JobStatus::Succeeded));
}

#[tokio::test]
async fn events_are_published_in_order() {
    init_tracing();

    let spec = SpecBuilder::new()
        .target("A", &[])
        .target("B", &["A"])
        .target("C", &["B"])
        .build();

    let build = run_fake_build(plan(spec), 1, |e| e.fail("B", "boom")).await;

    assert_eq!(
        build.events,
        vec![
            BuildEvent::Started {
                unit: "A".into(),
                kind: JobKind::Function
            },
            BuildEvent::Succeeded {
                unit: "A".into(),
                kind: JobKind::Function
            },
            BuildEvent::Started {
                unit: "B".into(),
                kind: JobKind::Function
            },
            BuildEvent::Failed {
                unit: "B".into(),
                kind: Some(JobKind::Function),
                error: "boom".into()
            },
            BuildEvent::Skipped {
                unit: "C".into(),
                status: JobStatus::SkippedUpstreamFailed("B".into())
            },
        ]
    );
}
