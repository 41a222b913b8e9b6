// tests/freshness.rs

mod common;
use crate::common::builders::SpecBuilder;
use crate::common::init_tracing;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use buildc::dag::{DependencyGraph, Freshness, FreshnessOracle};
use buildc::errors::BuildError;
use buildc::fs::mock::MockFileSystem;
use buildc::types::CheckMethod;

fn oracle(fs: &MockFileSystem, method: CheckMethod) -> FreshnessOracle {
    FreshnessOracle::new(Arc::new(fs.clone()), PathBuf::new(), method)
}

fn deps(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn missing_target_is_stale() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("src.c");

    assert!(oracle(&fs, CheckMethod::Mtime).is_stale("app", &deps(&["src.c"])).unwrap());
}

#[test]
fn target_older_than_a_dependency_is_stale() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("app");
    fs.add_file("src.c");

    assert!(oracle(&fs, CheckMethod::Mtime).is_stale("app", &deps(&["src.c"])).unwrap());
}

#[test]
fn target_newer_than_all_dependencies_is_fresh() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("a.c");
    fs.add_file("b.c");
    fs.add_file("app");

    assert!(!oracle(&fs, CheckMethod::Mtime).is_stale("app", &deps(&["a.c", "b.c"])).unwrap());
}

#[test]
fn equal_modification_times_are_fresh() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("src.c");
    fs.add_file("app");
    let when = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(100);
    fs.set_modified("src.c", when);
    fs.set_modified("app", when);

    assert!(!oracle(&fs, CheckMethod::Mtime).is_stale("app", &deps(&["src.c"])).unwrap());
}

#[test]
fn missing_dependency_makes_an_existing_target_stale() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("app");

    assert!(oracle(&fs, CheckMethod::Mtime).is_stale("app", &deps(&["gone.c"])).unwrap());
}

#[test]
fn stat_error_is_an_error_not_staleness() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("app");
    fs.add_unreadable("secret.c", io::ErrorKind::PermissionDenied);

    let err = oracle(&fs, CheckMethod::Mtime)
        .is_stale("app", &deps(&["secret.c"]))
        .unwrap_err();
    assert!(matches!(err, BuildError::FreshnessCheck { .. }));
}

#[test]
fn force_is_always_stale() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("src.c");
    fs.add_file("app");

    assert!(oracle(&fs, CheckMethod::Force).is_stale("app", &deps(&["src.c"])).unwrap());
}

#[test]
fn ignore_only_checks_existence() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("app");
    fs.add_file("src.c");

    let o = oracle(&fs, CheckMethod::Ignore);
    assert!(!o.is_stale("app", &deps(&["src.c"])).unwrap());
    assert!(o.is_stale("missing", &deps(&["src.c"])).unwrap());
}

#[test]
fn staleness_propagates_to_transitive_dependents() {
    init_tracing();

    // app <- lib.o <- lib.c ; lib.c was edited after everything was built.
    let fs = MockFileSystem::new();
    fs.add_file("app");
    fs.add_file("lib.o");
    fs.add_file("lib.c");

    let spec = SpecBuilder::new()
        .target("app", &["lib.o"])
        .target("lib.o", &["lib.c"])
        .build();
    let (descriptors, _) = spec.into_parts();
    let mut graph = DependencyGraph::build(descriptors).unwrap();
    graph.compute_freshness(&oracle(&fs, CheckMethod::Mtime)).unwrap();

    assert_eq!(graph.node("lib.c").unwrap().freshness, Freshness::Fresh);
    assert_eq!(graph.node("lib.o").unwrap().freshness, Freshness::Stale);
    // app itself is newer than lib.o, but lib.o will be rebuilt.
    assert_eq!(graph.node("app").unwrap().freshness, Freshness::Stale);
}

#[test]
fn up_to_date_graph_is_entirely_fresh() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("lib.c");
    fs.add_file("lib.o");
    fs.add_file("app");

    let spec = SpecBuilder::new()
        .target("app", &["lib.o"])
        .target("lib.o", &["lib.c"])
        .build();
    let (descriptors, _) = spec.into_parts();
    let mut graph = DependencyGraph::build(descriptors).unwrap();
    graph.compute_freshness(&oracle(&fs, CheckMethod::Mtime)).unwrap();

    for t in ["lib.c", "lib.o", "app"] {
        assert_eq!(graph.node(t).unwrap().freshness, Freshness::Fresh, "{t}");
    }
}

#[test]
fn missing_leaf_is_stale_and_unreadable_leaf_is_an_error() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_unreadable("locked.c", io::ErrorKind::PermissionDenied);

    let spec = SpecBuilder::new()
        .target("a", &["absent.c"])
        .target("b", &["locked.c"])
        .build();
    let (descriptors, _) = spec.into_parts();
    let mut graph = DependencyGraph::build(descriptors).unwrap();
    graph.compute_freshness(&oracle(&fs, CheckMethod::Mtime)).unwrap();

    assert_eq!(graph.node("absent.c").unwrap().freshness, Freshness::Stale);
    assert!(matches!(
        graph.node("locked.c").unwrap().freshness,
        Freshness::Error(_)
    ));
    // The consumer is not stat-ed against the unreadable input again.
    assert_eq!(graph.node("b").unwrap().freshness, Freshness::Stale);
}
