//! Ambient lookup and event forwarding
//!
//! This is the surface the run manager calls from deep inside the call tree.
//! For every lifecycle event it asks each observer kind whether a handle is
//! active and, if so, hands the event over. Nothing here fails: a kind that
//! was never activated is simply skipped.

use crate::event::RunEvent;
use crate::kind::{CallbackHandler, ObserverKind, RunCollection, TracingSession, UsageTracking};
use crate::slot::AmbientSlot;
use std::sync::Arc;
use tracing::trace;

/// The active observer of kind `K` in the current call tree
pub fn lookup<K: ObserverKind>() -> Option<Arc<K::Handle>> {
    AmbientSlot::<K>::read()
}

/// Whether an observer of kind `K` is active in the current call tree
pub fn is_active<K: ObserverKind>() -> bool {
    AmbientSlot::<K>::is_active()
}

/// Report `event` to the active observer of kind `K`
///
/// Returns whether an observer received it.
pub fn forward<K: ObserverKind>(event: &RunEvent) -> bool {
    match lookup::<K>() {
        Some(handle) => {
            trace!(kind = K::NAME, run_id = %event.run_id, "Forwarding run event");
            handle.on_event(event);
            true
        }
        None => false,
    }
}

/// Report `event` to every built-in observer kind that is active
///
/// Returns the number of observers that received it.
pub fn dispatch(event: &RunEvent) -> usize {
    [
        forward::<UsageTracking>(event),
        forward::<TracingSession>(event),
        forward::<RunCollection>(event),
    ]
    .into_iter()
    .filter(|delivered| *delivered)
    .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::{activate, collect_runs, with_usage_tracking};
    use crate::context::AmbientContext;
    use crate::event::{RunType, TokenUsage};
    use crate::handlers::UsageTracker;

    #[test]
    fn test_dispatch_without_observers() {
        let event = RunEvent::start("chain", RunType::Chain);
        for _ in 0..10 {
            assert_eq!(dispatch(&event), 0);
            assert!(!forward::<UsageTracking>(&event));
        }
        AmbientContext::new().sync_scope(|| assert_eq!(dispatch(&event), 0));
    }

    #[tokio::test]
    async fn test_dispatch_reaches_all_active_kinds() {
        let (delivered, tracker, collector) = with_usage_tracking(|tracker| async move {
            collect_runs(|collector| async move {
                let delivered = dispatch(&RunEvent::llm_end("gpt-4", TokenUsage::new(10, 10)));
                (delivered, tracker, collector)
            })
            .await
        })
        .await;

        assert_eq!(delivered, 2);
        assert_eq!(tracker.total_tokens(), 20);
        assert_eq!(collector.len(), 1);
    }

    #[tokio::test]
    async fn test_forward_targets_one_kind() {
        let tracker = Arc::new(UsageTracker::new());
        let forwarded = activate::<UsageTracking, _>(Arc::clone(&tracker), async {
            forward::<UsageTracking>(&RunEvent::end("gpt-4", RunType::Llm).with_cost(2.0))
        })
        .await;

        assert!(forwarded);
        assert!((tracker.total_cost() - 2.0).abs() < 1e-9);
        assert!(!is_active::<UsageTracking>());
    }
}
