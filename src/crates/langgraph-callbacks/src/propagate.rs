//! Inheritance of the ambient context across task and thread boundaries
//!
//! Tokio task-locals are not inherited by `tokio::spawn`: a task spawned
//! directly starts with no ambient observers at all. Work that belongs to
//! the same call tree should be spawned through the helpers here, which
//! snapshot the parent's context and bind the copy in the child.
//!
//! The child gets a copy, not a reference. Handles are shared (both sides
//! report to the same tracker), but bindings are not: an activation inside
//! the child shadows the parent's observer only for the child.

use crate::context::AmbientContext;
use std::cell::RefCell;
use std::future::Future;
use tokio::task::futures::TaskLocalFuture;
use tokio::task::JoinHandle;

/// Spawn a task that inherits the current ambient context
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(future.in_ambient_context())
}

/// Run blocking work on tokio's blocking pool with the current ambient context
pub fn spawn_blocking<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let ctx = AmbientContext::current_or_default();
    tokio::task::spawn_blocking(move || ctx.sync_scope(f))
}

/// Spawn an OS thread that inherits the current ambient context
pub fn spawn_thread<F, R>(f: F) -> std::thread::JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let ctx = AmbientContext::current_or_default();
    std::thread::spawn(move || ctx.sync_scope(f))
}

/// Bind an ambient context to a future
pub trait AmbientFutureExt: Future + Sized {
    /// Bind a snapshot of the caller's current context
    ///
    /// The snapshot is taken when this method is called, not when the
    /// future is first polled.
    fn in_ambient_context(self) -> TaskLocalFuture<RefCell<AmbientContext>, Self> {
        AmbientContext::current_or_default().scope(self)
    }

    /// Bind an explicit context
    fn with_ambient_context(
        self,
        ctx: AmbientContext,
    ) -> TaskLocalFuture<RefCell<AmbientContext>, Self> {
        ctx.scope(self)
    }
}

impl<F: Future> AmbientFutureExt for F {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::with_usage_tracking;
    use crate::kind::UsageTracking;
    use crate::lookup::lookup;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_spawn_inherits() {
        with_usage_tracking(|tracker| async move {
            let seen = spawn(async { lookup::<UsageTracking>() }).await.unwrap();
            assert!(Arc::ptr_eq(&seen.unwrap(), &tracker));
        })
        .await;
    }

    #[tokio::test]
    async fn test_plain_tokio_spawn_does_not_inherit() {
        with_usage_tracking(|_tracker| async move {
            let seen = tokio::spawn(async { lookup::<UsageTracking>() }).await.unwrap();
            assert!(seen.is_none());
        })
        .await;
    }

    #[tokio::test]
    async fn test_spawn_blocking_and_thread_inherit() {
        with_usage_tracking(|tracker| async move {
            let blocking = spawn_blocking(|| lookup::<UsageTracking>())
                .await
                .unwrap()
                .unwrap();
            assert!(Arc::ptr_eq(&blocking, &tracker));

            let threaded = spawn_thread(|| lookup::<UsageTracking>())
                .join()
                .unwrap()
                .unwrap();
            assert!(Arc::ptr_eq(&threaded, &tracker));
        })
        .await;
    }

    #[tokio::test]
    async fn test_with_ambient_context() {
        let ctx = AmbientContext::new();
        let bound = async { AmbientContext::is_bound() }
            .with_ambient_context(ctx)
            .await;
        assert!(bound);
        assert!(!AmbientContext::is_bound());
    }
}
