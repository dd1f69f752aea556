// tests/check_run_lifecycle.rs

use std::sync::Arc;

use checkrun::control::ExecutionContext;
use checkrun::dashboard::{CheckRun, DashboardEvent, DashboardNodeRun};
use checkrun::errors::CheckRunError;
use checkrun::types::RunStatus;
use checkrun::workspace::ControlDefinition;
use checkrun_test_utils::builders::TreeFixture;
use checkrun_test_utils::fake_engine::FakeControlEngine;
use checkrun_test_utils::static_parent::StaticParent;
use checkrun_test_utils::{init_tracing, with_timeout};

fn control_run(fx: &TreeFixture, parent: &StaticParent, short: &str) -> Arc<CheckRun> {
    CheckRun::new(Arc::new(ControlDefinition::new(short)), parent, &fx.tree).unwrap()
}

#[tokio::test]
async fn set_complete_publishes_once_and_signals_parent_once() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new());
    let mut parent = StaticParent::new(1);
    let run = control_run(&fx, &parent, "a");

    run.set_complete().await.unwrap();

    assert_eq!(run.run_status(), RunStatus::Complete);
    assert!(run.error().is_none());
    assert!(run.run_complete());
    assert!(run.children_complete());

    let events = fx.workspace.leaf_events_for("control.a");
    assert_eq!(events.len(), 1);
    match &events[0] {
        DashboardEvent::LeafNodeComplete { leaf_node, session } => {
            assert_eq!(leaf_node.name(), "control.a");
            assert_eq!(session, "session-1");
        }
        other => panic!("Expected LeafNodeComplete, got: {:?}", other),
    }

    let signals = parent.drain_now();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].name(), "control.a");
}

#[tokio::test]
async fn set_error_shares_one_error_between_run_and_event() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new());
    let mut parent = StaticParent::new(1);
    let run = control_run(&fx, &parent, "a");

    let err = Arc::new(CheckRunError::ResourceNotFound("control.a".to_string()));
    run.set_error(Arc::clone(&err)).await.unwrap();

    assert_eq!(run.run_status(), RunStatus::Error);
    assert!(run.run_complete());
    assert!(run.children_complete());
    let stored = run.error().expect("error must be stored");
    assert!(Arc::ptr_eq(&stored, &err));

    let events = fx.workspace.leaf_events_for("control.a");
    assert_eq!(events.len(), 1);
    match &events[0] {
        DashboardEvent::LeafNodeError {
            leaf_node,
            session,
            error,
        } => {
            assert_eq!(leaf_node.name(), "control.a");
            assert_eq!(session, "session-1");
            assert!(Arc::ptr_eq(error, &err));
        }
        other => panic!("Expected LeafNodeError, got: {:?}", other),
    }

    assert_eq!(parent.drain_now().len(), 1);
}

#[tokio::test]
#[should_panic(expected = "is already complete")]
async fn second_terminal_transition_panics() {
    let fx = TreeFixture::new(FakeControlEngine::new());
    let parent = StaticParent::new(2);
    let run = control_run(&fx, &parent, "a");

    run.set_complete().await.unwrap();
    let _ = run
        .set_error(Arc::new(CheckRunError::ResourceNotFound("x".to_string())))
        .await;
}

#[tokio::test]
async fn failed_second_transition_leaves_first_outcome_intact() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new());
    let mut parent = StaticParent::new(2);
    let run = control_run(&fx, &parent, "a");

    run.set_complete().await.unwrap();

    let again = Arc::clone(&run);
    let joined = tokio::spawn(async move { again.set_complete().await }).await;
    assert!(joined.is_err(), "second transition should panic");

    assert_eq!(run.run_status(), RunStatus::Complete);
    assert_eq!(fx.workspace.leaf_events_for("control.a").len(), 1);
    assert_eq!(parent.drain_now().len(), 1);
}

#[tokio::test]
async fn execute_success_stores_execution_tree_and_completes() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new());
    let mut parent = StaticParent::new(1);
    let run = control_run(&fx, &parent, "a");

    with_timeout(Arc::clone(&run).execute(ExecutionContext::new()))
        .await
        .unwrap();

    assert_eq!(run.run_status(), RunStatus::Complete);
    let tree = run.execution_tree().expect("execution tree should be set");
    assert_eq!(tree.root().group_id(), "control.a");

    assert_eq!(fx.engine.built(), vec!["control.a".to_string()]);
    assert_eq!(fx.engine.executed(), vec!["control.a".to_string()]);
    assert_eq!(fx.workspace.events_of_kind("leaf_node_complete").len(), 1);
    assert!(fx.workspace.events_of_kind("leaf_node_error").is_empty());
    assert_eq!(parent.drain_now().len(), 1);
}

#[tokio::test]
async fn execute_build_failure_returns_the_recorded_error() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new().fail_build("control.a"));
    let mut parent = StaticParent::new(1);
    let run = control_run(&fx, &parent, "a");

    let result = with_timeout(Arc::clone(&run).execute(ExecutionContext::new())).await;

    let source = match result {
        Err(CheckRunError::RunFailed { name, source }) => {
            assert_eq!(name, "control.a");
            source
        }
        other => panic!("Expected RunFailed, got: {:?}", other),
    };
    assert!(matches!(
        source.as_ref(),
        CheckRunError::ResourceNotFound(name) if name == "control.a"
    ));

    assert_eq!(run.run_status(), RunStatus::Error);
    assert!(run.execution_tree().is_none());
    let stored = run.error().expect("error must be stored");
    assert!(Arc::ptr_eq(&stored, &source));

    let events = fx.workspace.leaf_events_for("control.a");
    assert_eq!(events.len(), 1);
    match &events[0] {
        DashboardEvent::LeafNodeError { error, .. } => assert!(Arc::ptr_eq(error, &source)),
        other => panic!("Expected LeafNodeError, got: {:?}", other),
    }

    assert!(fx.engine.executed().is_empty());
    assert_eq!(parent.drain_now().len(), 1);
}

#[tokio::test]
async fn closed_parent_channel_is_reported() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new());
    let parent = StaticParent::new(1);
    let run = control_run(&fx, &parent, "a");
    drop(parent);

    match run.set_complete().await {
        Err(CheckRunError::CompletionChannelClosed(name)) => assert_eq!(name, "control.a"),
        other => panic!("Expected CompletionChannelClosed, got: {:?}", other),
    }
    // The transition and event still happened.
    assert_eq!(run.run_status(), RunStatus::Complete);
    assert_eq!(fx.workspace.leaf_events_for("control.a").len(), 1);
}

#[tokio::test]
async fn dropped_tree_fails_the_run_and_still_signals() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new());
    let mut parent = StaticParent::new(1);
    let run = control_run(&fx, &parent, "a");

    let TreeFixture {
        tree,
        workspace,
        engine,
    } = fx;
    drop(tree);

    let result = with_timeout(Arc::clone(&run).execute(ExecutionContext::new())).await;

    match result {
        Err(CheckRunError::RunFailed { source, .. }) => assert!(matches!(
            source.as_ref(),
            CheckRunError::ExecutionTreeDropped(name) if name == "control.a"
        )),
        other => panic!("Expected RunFailed, got: {:?}", other),
    }
    assert_eq!(run.run_status(), RunStatus::Error);
    assert!(engine.built().is_empty());
    // No tree, no session: the event has nowhere to go.
    assert!(workspace.events().is_empty());
    assert_eq!(parent.drain_now().len(), 1);
}

#[tokio::test]
async fn serialized_run_carries_status_and_error() {
    init_tracing();
    let fx = TreeFixture::new(FakeControlEngine::new().fail_build("control.a"));
    let parent = StaticParent::new(1);
    let run = control_run(&fx, &parent, "a");

    let before = serde_json::to_value(run.as_ref()).unwrap();
    assert_eq!(before["status"], "ready");
    assert_eq!(before["node_type"], "control");
    assert_eq!(before["dashboard"], "test_dashboard");
    assert!(before.get("error").is_none());

    let _ = Arc::clone(&run).execute(ExecutionContext::new()).await;

    let after = serde_json::to_value(run.as_ref()).unwrap();
    assert_eq!(after["name"], "control.a");
    assert_eq!(after["status"], "error");
    assert!(after["error"].as_str().unwrap().contains("control.a"));
    assert!(after["execution_tree"].is_null());
}
