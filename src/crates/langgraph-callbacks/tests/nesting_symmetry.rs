//! Property tests: any nesting of activations restores exactly

use futures::future::{BoxFuture, FutureExt};
use langgraph_callbacks::{
    activate, activate_manual, activate_sync, lookup, AmbientContext, UsageTracker, UsageTracking,
};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
enum Step {
    /// Bracketed activation (guard for sync, task-local scope for async)
    Bracketed,
    /// Manual activate / deactivate pair
    Manual,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![Just(Step::Bracketed), Just(Step::Manual)]
}

fn assert_current(expected: &Option<Arc<UsageTracker>>) {
    match (lookup::<UsageTracking>(), expected) {
        (None, None) => {}
        (Some(found), Some(expected)) => assert!(Arc::ptr_eq(&found, expected)),
        (found, expected) => panic!(
            "expected active = {}, found active = {}",
            expected.is_some(),
            found.is_some()
        ),
    }
}

fn nest_sync(steps: &[Step], outer: Option<Arc<UsageTracker>>) {
    let Some((step, rest)) = steps.split_first() else {
        return;
    };
    let handle = Arc::new(UsageTracker::new());

    match step {
        Step::Bracketed => activate_sync::<UsageTracking, _>(Arc::clone(&handle), |h| {
            assert_current(&Some(Arc::clone(h)));
            nest_sync(rest, Some(Arc::clone(h)));
            assert_current(&Some(Arc::clone(h)));
        }),
        Step::Manual => {
            let activation = activate_manual::<UsageTracking>(Arc::clone(&handle)).unwrap();
            assert_current(&Some(Arc::clone(&handle)));
            nest_sync(rest, Some(Arc::clone(&handle)));
            assert_current(&Some(Arc::clone(&handle)));
            activation.deactivate();
        }
    }

    assert_current(&outer);
}

fn nest_async(steps: Vec<Step>, outer: Option<Arc<UsageTracker>>) -> BoxFuture<'static, ()> {
    async move {
        let Some((step, rest)) = steps.split_first() else {
            return;
        };
        let rest = rest.to_vec();
        let handle = Arc::new(UsageTracker::new());

        match step {
            Step::Bracketed => {
                let inner = Arc::clone(&handle);
                activate::<UsageTracking, _>(handle, async move {
                    assert_current(&Some(Arc::clone(&inner)));
                    tokio::task::yield_now().await;
                    nest_async(rest, Some(Arc::clone(&inner))).await;
                    assert_current(&Some(inner));
                })
                .await;
            }
            Step::Manual => {
                let activation = activate_manual::<UsageTracking>(Arc::clone(&handle)).unwrap();
                tokio::task::yield_now().await;
                assert_current(&Some(Arc::clone(&handle)));
                nest_async(rest, Some(Arc::clone(&handle))).await;
                assert_current(&Some(handle));
                activation.deactivate();
            }
        }

        assert_current(&outer);
    }
    .boxed()
}

proptest! {
    #[test]
    fn prop_sync_nesting_restores(steps in prop::collection::vec(step_strategy(), 0..12)) {
        AmbientContext::new().sync_scope(|| {
            nest_sync(&steps, None);
            assert_current(&None);
        });
        assert_current(&None);
    }

    #[test]
    fn prop_async_nesting_restores(steps in prop::collection::vec(step_strategy(), 0..12)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        runtime.block_on(AmbientContext::new().scope(async move {
            nest_async(steps, None).await;
            assert_current(&None);
        }));
        assert_current(&None);
    }

    #[test]
    fn prop_sequential_reentry(count in 1usize..20) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        runtime.block_on(async {
            for _ in 0..count {
                let handle = Arc::new(UsageTracker::new());
                let inner = Arc::clone(&handle);
                activate::<UsageTracking, _>(handle, async move {
                    assert_current(&Some(inner));
                })
                .await;
                assert_current(&None);
            }
        });
    }
}
