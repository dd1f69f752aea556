// tests/check_run_construction.rs

use std::sync::Arc;

use checkrun::dashboard::{CheckRun, DashboardNodeRun};
use checkrun::errors::CheckRunError;
use checkrun::types::{NodeKind, RunStatus};
use checkrun::workspace::{
    BenchmarkDefinition, ControlDefinition, DashboardLeafNode, PanelDefinition, ResourceRef,
};
use checkrun_test_utils::builders::TreeFixture;
use checkrun_test_utils::fake_engine::FakeControlEngine;
use checkrun_test_utils::init_tracing;
use checkrun_test_utils::static_parent::StaticParent;

#[test]
fn card_panel_is_rejected_and_never_registered() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new());
    let parent = StaticParent::new(1);

    let card = Arc::new(PanelDefinition {
        name: "card.header".to_string(),
        block_type: "card".to_string(),
        title: Some("Header".to_string()),
        width: Some(4),
    });

    match CheckRun::new(card, &parent, &fx.tree) {
        Err(CheckRunError::InvalidNodeType { name, block_type }) => {
            assert_eq!(name, "card.header");
            assert_eq!(block_type, "card");
        }
        Err(e) => panic!("Expected InvalidNodeType, got: {:?}", e),
        Ok(run) => panic!("Expected error, got run {:?}", run),
    }

    assert!(!fx.tree.contains_run("card.header"));
    assert_eq!(fx.tree.run_count(), 0);
    assert!(fx.workspace.events().is_empty());
}

#[test]
fn unqualified_reference_is_rejected() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new());
    let parent = StaticParent::new(1);

    let result = CheckRun::new(Arc::new(ResourceRef::new("no_prefix")), &parent, &fx.tree);

    assert!(matches!(result, Err(CheckRunError::InvalidNodeType { .. })));
    assert_eq!(fx.tree.run_count(), 0);
}

#[test]
fn control_run_is_ready_and_registered_by_name() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new());
    let parent = StaticParent::new(1);

    let mut control = ControlDefinition::new("ebs_encrypted");
    control.title = Some("EBS volumes are encrypted".to_string());
    control.width = Some(6);

    let run = CheckRun::new(Arc::new(control), &parent, &fx.tree).unwrap();

    assert_eq!(run.name(), "control.ebs_encrypted");
    assert_eq!(run.kind(), NodeKind::Control);
    assert_eq!(run.node_type(), "control");
    assert_eq!(run.title(), Some("EBS volumes are encrypted"));
    assert_eq!(run.width(), Some(6));
    assert_eq!(run.dashboard_name(), "test_dashboard");
    assert_eq!(run.run_status(), RunStatus::Ready);
    assert!(!run.run_complete());
    assert!(!run.children_complete());
    assert!(run.error().is_none());
    assert!(run.execution_tree().is_none());

    let registered = fx
        .tree
        .get_run("control.ebs_encrypted")
        .expect("run should be registered during construction");
    assert_eq!(registered.name(), "control.ebs_encrypted");
    assert_eq!(registered.run_status(), RunStatus::Ready);
}

#[test]
fn benchmark_run_is_classified_as_benchmark() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new());
    let parent = StaticParent::new(1);

    let benchmark = BenchmarkDefinition::new("cis", vec!["control.a".to_string()]);
    let run = CheckRun::new(Arc::new(benchmark), &parent, &fx.tree).unwrap();

    assert_eq!(run.kind(), NodeKind::Benchmark);
    assert_eq!(run.resource().name(), "benchmark.cis");
    assert_eq!(run.node_type(), "benchmark");
    assert_eq!(fx.tree.run_names(), vec!["benchmark.cis".to_string()]);
}

#[test]
fn unresolved_control_reference_still_classifies() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new());
    let parent = StaticParent::new(1);

    let run = CheckRun::new(Arc::new(ResourceRef::new("control.missing")), &parent, &fx.tree)
        .unwrap();

    assert_eq!(run.kind(), NodeKind::Control);
    assert!(run.title().is_none());
    assert!(fx.tree.contains_run("control.missing"));
}

#[test]
fn duplicate_name_fails_without_replacing_the_first_run() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new());
    let parent = StaticParent::new(2);

    let first = CheckRun::new(Arc::new(ControlDefinition::new("a")), &parent, &fx.tree).unwrap();
    let second = CheckRun::new(Arc::new(ControlDefinition::new("a")), &parent, &fx.tree);

    match second {
        Err(CheckRunError::DuplicateRun(name)) => assert_eq!(name, "control.a"),
        other => panic!("Expected DuplicateRun, got: {:?}", other),
    }
    assert_eq!(fx.tree.run_count(), 1);
    assert_eq!(first.run_status(), RunStatus::Ready);
}

#[test]
fn concurrent_construction_registers_every_run() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new());

    std::thread::scope(|scope| {
        for i in 0..64 {
            let tree = &fx.tree;
            scope.spawn(move || {
                let parent = StaticParent::new(1);
                let control = ControlDefinition::new(&format!("c{i}"));
                CheckRun::new(Arc::new(control), &parent, tree).unwrap();
            });
        }
    });

    assert_eq!(fx.tree.run_count(), 64);
    for i in 0..64 {
        assert!(fx.tree.contains_run(&format!("control.c{i}")));
    }
}
