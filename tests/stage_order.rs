// tests/stage_order.rs

mod common;
use crate::common::builders::{SpecBuilder, func};
use crate::common::init_tracing;

use buildc::dag::{DEFAULT_STAGE, StagePlan};
use buildc::errors::BuildError;
use buildc::job::{BuildSpec, Job, JobDescriptor, Work};
use buildc::types::ScheduleMode;

fn group(spec: BuildSpec) -> StagePlan {
    let (descriptors, order) = spec.into_parts();
    StagePlan::group(descriptors, &order).unwrap()
}

fn named(stage: &str, job: &str) -> JobDescriptor {
    JobDescriptor::stage(func(job), Some(stage.to_string()))
}

#[test]
fn declared_order_wins_over_input_order() {
    init_tracing();

    // Input order C, A, B, A with declared order A, B, C.
    let spec = BuildSpec::new(
        vec![named("C", "c"), named("A", "a1"), named("B", "b"), named("A", "a2")],
        vec!["A".into(), "B".into(), "C".into()],
    )
    .unwrap();
    assert_eq!(spec.mode(), ScheduleMode::Stage);

    let plan = group(spec);
    let names: Vec<&str> = plan.stage_names().collect();
    assert_eq!(names, vec![DEFAULT_STAGE, "A", "B", "C"]);

    let a = &plan.stages()[1];
    assert_eq!(a.members.len(), 2);
    assert_eq!(a.members[0].work, Work::Single(Job::function("a1", vec![])));
    assert_eq!(a.members[1].work, Work::Single(Job::function("a2", vec![])));
}

#[test]
fn undeclared_stages_follow_first_occurrence() {
    init_tracing();

    let spec = BuildSpec::new(
        vec![named("C", "c"), named("A", "a"), named("B", "b"), named("A", "a")],
        vec![],
    )
    .unwrap();

    let plan = group(spec);
    let names: Vec<&str> = plan.stage_names().collect();
    assert_eq!(names, vec![DEFAULT_STAGE, "C", "A", "B"]);
}

#[test]
fn declared_stages_precede_undeclared_ones() {
    init_tracing();

    let spec = BuildSpec::new(
        vec![named("late", "x"), named("early", "y")],
        vec!["early".into()],
    )
    .unwrap();

    let plan = group(spec);
    let names: Vec<&str> = plan.stage_names().collect();
    assert_eq!(names, vec![DEFAULT_STAGE, "early", "late"]);
}

#[test]
fn unlabeled_jobs_go_to_the_default_stage_first() {
    init_tracing();

    let spec = SpecBuilder::new()
        .stage_job(Some("build"))
        .stage_job(None)
        .stage_job(None)
        .build();

    let plan = group(spec);
    assert_eq!(plan.stages()[0].name, DEFAULT_STAGE);
    assert_eq!(plan.stages()[0].members.len(), 2);
    assert_eq!(plan.stages()[1].name, "build");

    let ids: Vec<&str> = plan.stages()[0].members.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["_default:0", "_default:1"]);
    assert_eq!(plan.position("build"), Some(1));
}

#[test]
fn duplicate_declared_stage_is_rejected() {
    init_tracing();

    let err = BuildSpec::new(vec![named("A", "a")], vec!["A".into(), "A".into()]).unwrap_err();
    assert!(matches!(err, BuildError::ConfigError(_)));
}

#[test]
fn mixing_targets_and_stages_is_rejected() {
    init_tracing();

    let err = SpecBuilder::new()
        .target("app", &[])
        .stage_job(Some("test"))
        .try_build()
        .unwrap_err();
    let BuildError::ConfigError(msg) = &err else {
        panic!("expected a configuration error, got {err:?}");
    };
    assert!(msg.contains("app"));
    assert!(msg.contains("test"));
}

#[test]
fn unlabeled_job_in_a_target_build_is_rejected() {
    init_tracing();

    let err = SpecBuilder::new()
        .target("app", &[])
        .stage_job(None)
        .try_build()
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn stage_order_declaration_requires_stage_mode() {
    init_tracing();

    let err = SpecBuilder::new()
        .target("app", &[])
        .declare_stages(&["build"])
        .try_build()
        .unwrap_err();
    assert!(matches!(err, BuildError::ConfigError(_)));
}

#[test]
fn empty_spec_is_rejected() {
    init_tracing();

    assert!(matches!(
        BuildSpec::new(vec![], vec![]),
        Err(BuildError::ConfigError(_))
    ));
}
