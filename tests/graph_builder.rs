// tests/graph_builder.rs

mod common;
use crate::common::builders::{SpecBuilder, func};
use crate::common::init_tracing;

use buildc::dag::DependencyGraph;
use buildc::errors::BuildError;
use buildc::job::{BuildSpec, JobDescriptor};

fn graph_of(spec: BuildSpec) -> Result<DependencyGraph, BuildError> {
    let (descriptors, _) = spec.into_parts();
    DependencyGraph::build(descriptors)
}

#[test]
fn dependencies_come_before_dependents() {
    init_tracing();

    // app -> lib.o -> lib.c (leaf), app -> main.o -> main.c (leaf)
    let spec = SpecBuilder::new()
        .target("app", &["lib.o", "main.o"])
        .target("lib.o", &["lib.c"])
        .target("main.o", &["main.c"])
        .build();
    let graph = graph_of(spec).unwrap();

    assert_eq!(graph.len(), 5);
    let order = graph.topological_targets().unwrap();
    let pos = |t: &str| order.iter().position(|o| *o == t).unwrap();

    assert!(pos("lib.c") < pos("lib.o"));
    assert!(pos("main.c") < pos("main.o"));
    assert!(pos("lib.o") < pos("app"));
    assert!(pos("main.o") < pos("app"));
}

#[test]
fn undefined_dependencies_become_leaves() {
    init_tracing();

    let spec = SpecBuilder::new().target("out", &["in.txt"]).build();
    let graph = graph_of(spec).unwrap();

    let leaf = graph.node("in.txt").expect("leaf node created");
    assert!(leaf.is_leaf());
    assert!(!graph.node("out").unwrap().is_leaf());
    assert_eq!(graph.dependents_of("in.txt"), vec!["out".to_string()]);
    assert_eq!(graph.dependencies_of("out"), vec!["in.txt".to_string()]);
}

#[test]
fn duplicate_dependencies_are_collapsed() {
    init_tracing();

    let spec = SpecBuilder::new().target("out", &["a", "a", "b"]).build();
    let graph = graph_of(spec).unwrap();

    assert_eq!(graph.node("out").unwrap().dependencies, vec!["a", "b"]);
}

#[test]
fn cycle_is_reported_with_its_members() {
    init_tracing();

    let spec = SpecBuilder::new()
        .target("A", &["B"])
        .target("B", &["A"])
        .build();

    match graph_of(spec) {
        Err(BuildError::DependencyCycle(members)) => {
            assert!(members.contains(&"A".to_string()));
            assert!(members.contains(&"B".to_string()));
            assert_eq!(members.first(), members.last());
        }
        other => panic!("expected a dependency cycle, got {other:?}"),
    }
}

#[test]
fn longer_cycle_behind_an_acyclic_prefix_is_found() {
    init_tracing();

    let spec = SpecBuilder::new()
        .target("top", &["x"])
        .target("x", &["y"])
        .target("y", &["z"])
        .target("z", &["x"])
        .build();

    let err = graph_of(spec).unwrap_err();
    let BuildError::DependencyCycle(members) = &err else {
        panic!("expected a dependency cycle, got {err:?}");
    };
    assert!(!members.contains(&"top".to_string()));
    for t in ["x", "y", "z"] {
        assert!(members.contains(&t.to_string()), "{t} missing from {members:?}");
    }
    assert!(err.to_string().contains(" -> "));
}

#[test]
fn self_dependency_is_a_cycle() {
    init_tracing();

    let spec = SpecBuilder::new().target("A", &["A"]).build();
    assert!(matches!(graph_of(spec), Err(BuildError::DependencyCycle(_))));
}

#[test]
fn duplicate_target_is_a_configuration_error() {
    init_tracing();

    let spec = SpecBuilder::new().target("A", &[]).target("A", &["x"]).build();
    let err = graph_of(spec).unwrap_err();
    assert!(matches!(err, BuildError::ConfigError(_)));
    assert!(err.is_configuration());
}

#[test]
fn closure_contains_transitive_prerequisites_only() {
    init_tracing();

    // T1 <- T2 <- T3, T4 independent
    let spec = SpecBuilder::new()
        .target("T1", &[])
        .target("T2", &["T1"])
        .target("T3", &["T2"])
        .target("T4", &[])
        .build();
    let graph = graph_of(spec).unwrap();

    let closure = graph.closure_of(&["T3".to_string()]).unwrap();
    assert_eq!(closure.len(), 3);
    assert!(closure.contains("T1") && closure.contains("T2") && closure.contains("T3"));
    assert!(!closure.contains("T4"));
}

#[test]
fn closure_of_unknown_target_fails() {
    init_tracing();

    let spec = SpecBuilder::new().target("T1", &[]).build();
    let graph = graph_of(spec).unwrap();

    assert!(matches!(
        graph.closure_of(&["nope".to_string()]),
        Err(BuildError::UnknownTarget(t)) if t == "nope"
    ));
}

#[test]
fn stage_descriptor_cannot_join_a_graph() {
    init_tracing();

    let descriptors = vec![
        JobDescriptor::target(func("noop"), "A", vec![]),
        JobDescriptor::stage(func("noop"), Some("build".to_string())),
    ];
    assert!(matches!(
        DependencyGraph::build(descriptors),
        Err(BuildError::ConfigError(_))
    ));
}
