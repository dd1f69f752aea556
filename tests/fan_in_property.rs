// tests/fan_in_property.rs

use std::time::Duration;

use checkrun::control::ExecutionContext;
use checkrun::dashboard::DashboardNodeRun;
use checkrun::types::RunStatus;
use checkrun::workspace::{ControlDefinition, ModResources};
use checkrun_test_utils::builders::TreeFixture;
use checkrun_test_utils::fake_engine::FakeControlEngine;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever mix of leaves fail, every leaf ends terminal with one event,
    /// and the root is `Error` iff at least one leaf failed.
    #[test]
    fn every_leaf_reaches_one_terminal_state(
        failing in proptest::collection::vec(any::<bool>(), 1..12),
        delay_ms in 0u64..5,
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let names: Vec<String> = (0..failing.len()).map(|i| format!("control.c{i}")).collect();

        let mut resources = ModResources::new();
        let mut engine = FakeControlEngine::new().with_delay(Duration::from_millis(delay_ms));
        for (i, fails) in failing.iter().enumerate() {
            resources.add_control(ControlDefinition::new(&format!("c{i}")));
            if *fails {
                engine = engine.fail_build(&names[i]);
            }
        }

        let fx = TreeFixture::with_resources(engine, resources);
        let leaves = fx.tree.build_dashboard(None, &names).unwrap();

        let status = runtime
            .block_on(fx.tree.execute(&ExecutionContext::new()))
            .unwrap();

        let any_failed = failing.iter().any(|f| *f);
        prop_assert_eq!(status == RunStatus::Error, any_failed);

        for (leaf, fails) in leaves.iter().zip(&failing) {
            let expected = if *fails { RunStatus::Error } else { RunStatus::Complete };
            prop_assert_eq!(leaf.run_status(), expected);
            prop_assert_eq!(leaf.error().is_some(), *fails);
            prop_assert_eq!(fx.workspace.leaf_events_for(leaf.name()).len(), 1);
        }

        let root = fx.tree.root().unwrap();
        prop_assert!(root.children_complete());
        prop_assert_eq!(root.run_status(), if any_failed { RunStatus::Error } else { RunStatus::Complete });
    }
}
