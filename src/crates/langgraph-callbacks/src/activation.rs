//! Scoped activation of ambient observers
//!
//! Two shapes are offered:
//!
//! - **Bracketed** ([`activate`], [`activate_with`], [`activate_sync`] and the
//!   per-kind entry points): the observer is active exactly for the enclosed
//!   work. The previous binding comes back on every exit path: normal
//!   return, `Err` propagation, panic, or the future being dropped by a
//!   timeout or cancellation.
//! - **Manual pair** ([`activate_manual`] + [`ManualActivation::deactivate`]):
//!   for callers that cannot express their work as one block.
//!
//! # Manual activation is the unsafe shape
//!
//! A [`ManualActivation`] that is dropped without calling `deactivate`
//! leaves its observer installed for the rest of the enclosing ambient
//! context. Nothing detects this at runtime. Prefer the bracketed shape
//! wherever the work fits in one closure or future.
//!
//! # Example
//!
//! ```rust
//! use langgraph_callbacks::{dispatch, with_usage_tracking, RunEvent, TokenUsage};
//!
//! # async fn example() {
//! let tracker = with_usage_tracking(|tracker| async move {
//!     // deep inside the call tree, the run manager reports usage
//!     dispatch(&RunEvent::llm_end("gpt-4", TokenUsage::new(1000, 500)));
//!     tracker
//! })
//! .await;
//!
//! assert_eq!(tracker.total_tokens(), 1500);
//! # }
//! ```

use crate::config::{CallbacksConfig, DEFAULT_SESSION_NAME};
use crate::context::AmbientContext;
use crate::error::Result;
use crate::handlers::{LogExporter, RunCollector, TraceExporter, TracerSession, UsageTracker};
use crate::kind::{ObserverKind, RunCollection, TracingSession, UsageTracking};
use crate::slot::{AmbientSlot, Previous};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// Run `future` with `handle` active for kind `K`
///
/// The future runs in its own copy of the caller's ambient context, so the
/// caller's binding is never mutated and restore cannot be skipped.
pub async fn activate<K, F>(handle: Arc<K::Handle>, future: F) -> F::Output
where
    K: ObserverKind,
    F: Future,
{
    debug!(kind = K::NAME, "Activating ambient observer");
    let ctx = AmbientContext::current_or_default().with_handle::<K>(handle);
    let output = ctx.scope(future).await;
    debug!(kind = K::NAME, "Ambient observer scope exited");
    output
}

/// Like [`activate`], but hands the live handle to the enclosed work
///
/// `f` is called inside the activated scope.
pub async fn activate_with<K, F, Fut>(handle: Arc<K::Handle>, f: F) -> Fut::Output
where
    K: ObserverKind,
    F: FnOnce(Arc<K::Handle>) -> Fut,
    Fut: Future,
{
    let live = Arc::clone(&handle);
    activate::<K, _>(handle, async move { f(live).await }).await
}

/// Run `f` synchronously with `handle` active for kind `K`
///
/// Inside an ambient context the handle is installed in place and removed
/// by an [`ActivationGuard`], which also runs while a panic unwinds.
/// Outside any context a fresh root context is bound for the call.
pub fn activate_sync<K, R>(handle: Arc<K::Handle>, f: impl FnOnce(&Arc<K::Handle>) -> R) -> R
where
    K: ObserverKind,
{
    match ActivationGuard::<K>::install(Arc::clone(&handle)) {
        Ok(guard) => {
            let output = f(&handle);
            drop(guard);
            output
        }
        Err(_) => AmbientContext::new()
            .with_handle::<K>(Arc::clone(&handle))
            .sync_scope(|| f(&handle)),
    }
}

/// Install `handle` until [`ManualActivation::deactivate`] is called
///
/// See the module docs: forgetting to deactivate leaks the observer into
/// the rest of the enclosing context. Requires an ambient context.
pub fn activate_manual<K: ObserverKind>(handle: Arc<K::Handle>) -> Result<ManualActivation<K>> {
    let previous = AmbientSlot::<K>::install(handle)?;
    debug!(kind = K::NAME, "Manually activated ambient observer");
    Ok(ManualActivation { previous })
}

/// RAII guard that restores the previous observer of kind `K` on drop
///
/// Do not hold a guard across `.await`: other futures in the same task
/// would see the observer. The guard is `!Send` so such a future cannot be
/// spawned; use [`activate`] for async work.
pub struct ActivationGuard<K: ObserverKind> {
    previous: Option<Previous<K>>,
    _not_send: PhantomData<*const ()>,
}

impl<K: ObserverKind> ActivationGuard<K> {
    /// Install `handle` into the bound ambient context
    pub fn install(handle: Arc<K::Handle>) -> Result<Self> {
        let previous = AmbientSlot::<K>::install(handle)?;
        Ok(Self {
            previous: Some(previous),
            _not_send: PhantomData,
        })
    }

    /// The handle this guard installed
    pub fn handle(&self) -> Option<&Arc<K::Handle>> {
        self.previous.as_ref().map(Previous::installed)
    }
}

impl<K: ObserverKind> Drop for ActivationGuard<K> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            AmbientSlot::restore(previous);
        }
    }
}

/// An observer installed by [`activate_manual`]
#[must_use = "a manual activation that is never deactivated stays installed"]
pub struct ManualActivation<K: ObserverKind> {
    previous: Previous<K>,
}

impl<K: ObserverKind> ManualActivation<K> {
    /// The handle that was installed
    pub fn handle(&self) -> &Arc<K::Handle> {
        self.previous.installed()
    }

    /// Restore the observer that was active before
    pub fn deactivate(self) {
        debug!(kind = K::NAME, "Manually deactivated ambient observer");
        AmbientSlot::restore(self.previous);
    }
}

/// Run `f` with a fresh [`UsageTracker`] active
pub async fn with_usage_tracking<F, Fut>(f: F) -> Fut::Output
where
    F: FnOnce(Arc<UsageTracker>) -> Fut,
    Fut: Future,
{
    activate_with::<UsageTracking, _, _>(Arc::new(UsageTracker::new()), f).await
}

/// Synchronous form of [`with_usage_tracking`]
pub fn usage_tracking_sync<R>(f: impl FnOnce(&Arc<UsageTracker>) -> R) -> R {
    activate_sync::<UsageTracking, R>(Arc::new(UsageTracker::new()), f)
}

/// Run `f` with a tracing session that logs through `tracing`
pub async fn tracing_enabled<F, Fut>(session_name: impl Into<String>, f: F) -> Fut::Output
where
    F: FnOnce(Arc<TracerSession>) -> Fut,
    Fut: Future,
{
    tracing_enabled_with(session_name, Arc::new(LogExporter), f).await
}

/// [`tracing_enabled`] under the default session label
pub async fn tracing_enabled_default<F, Fut>(f: F) -> Fut::Output
where
    F: FnOnce(Arc<TracerSession>) -> Fut,
    Fut: Future,
{
    tracing_enabled(DEFAULT_SESSION_NAME, f).await
}

/// Run `f` with a tracing session that writes to `exporter`
pub async fn tracing_enabled_with<F, Fut>(
    session_name: impl Into<String>,
    exporter: Arc<dyn TraceExporter>,
    f: F,
) -> Fut::Output
where
    F: FnOnce(Arc<TracerSession>) -> Fut,
    Fut: Future,
{
    let session = Arc::new(TracerSession::new(session_name, exporter));
    info!(session = %session.session_name(), "Tracing session enabled");
    activate_with::<TracingSession, _, _>(session, f).await
}

/// Run `future` under a tracing session if `config` enables tracing
///
/// Uses the configured project as the session label.
pub async fn tracing_from_env<F: Future>(config: &CallbacksConfig, future: F) -> F::Output {
    if !config.tracing_enabled {
        return future.await;
    }

    let project = if config.project.trim().is_empty() {
        DEFAULT_SESSION_NAME.to_string()
    } else {
        config.project.clone()
    };
    tracing_enabled(project, |_| future).await
}

/// Run `f` with a fresh [`RunCollector`] active
pub async fn collect_runs<F, Fut>(f: F) -> Fut::Output
where
    F: FnOnce(Arc<RunCollector>) -> Fut,
    Fut: Future,
{
    activate_with::<RunCollection, _, _>(Arc::new(RunCollector::new()), f).await
}
