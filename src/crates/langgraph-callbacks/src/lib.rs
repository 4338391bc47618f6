//! # langgraph-callbacks - Ambient Observers for Call Trees
//!
//! Model invocations, chained sub-calls, tool calls and retrievals form a
//! call tree at run time. Cross-cutting observers (usage and cost
//! accounting, a tracing session, a run collector) want to see every event in
//! that tree, but threading an observer argument through every call is
//! intrusive. This crate makes an observer *ambient* for a dynamic extent of
//! execution instead.
//!
//! ## Pieces
//!
//! - **Ambient slot** ([`slot`]): one slot per [`ObserverKind`], stored in
//!   the task's [`AmbientContext`]. Isolated between unrelated call trees,
//!   even when they share a worker thread.
//! - **Scoped activation** ([`activation`]): installs an observer for the
//!   duration of a block and restores the previous one on every exit path.
//! - **Ambient lookup** ([`lookup`]): what the run manager calls for each
//!   lifecycle event; absence is a normal no-op.
//! - **Propagation** ([`propagate`]): spawn helpers that let child tasks and
//!   threads inherit the parent's observers.
//!
//! ## Quick Start
//!
//! ```rust
//! use langgraph_callbacks::{
//!     collect_runs, dispatch, lookup, propagate, with_usage_tracking, RunEvent, RunType,
//!     TokenUsage, UsageTracking,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (tracker, collector) = with_usage_tracking(|tracker| async move {
//!     collect_runs(|collector| async move {
//!         // a model call somewhere in the tree
//!         dispatch(&RunEvent::llm_end("gpt-4", TokenUsage::new(200, 50)));
//!
//!         // children spawned through `propagate` see the same observers
//!         propagate::spawn(async {
//!             dispatch(&RunEvent::end("search", RunType::Tool));
//!         })
//!         .await
//!         .unwrap();
//!
//!         (tracker, collector)
//!     })
//!     .await
//! })
//! .await;
//!
//! assert_eq!(tracker.total_tokens(), 250);
//! assert_eq!(collector.len(), 2);
//!
//! // outside the scope nothing is active
//! assert!(lookup::<UsageTracking>().is_none());
//! # }
//! ```

pub mod activation;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod handlers;
pub mod kind;
pub mod lookup;
pub mod propagate;
pub mod slot;

pub use activation::{
    activate, activate_manual, activate_sync, activate_with, collect_runs, tracing_enabled,
    tracing_enabled_default, tracing_enabled_with, tracing_from_env, usage_tracking_sync,
    with_usage_tracking, ActivationGuard, ManualActivation,
};
pub use config::{env_var_is_set, CallbacksConfig};
pub use context::AmbientContext;
pub use error::{CallbackError, Result};
pub use event::{RunEvent, RunPhase, RunType, TokenUsage};
pub use handlers::{
    InMemoryExporter, LogExporter, RunCollector, TraceExporter, TraceRecord, TracerSession,
    UsageTotals, UsageTracker,
};
pub use kind::{CallbackHandler, ObserverKind, RunCollection, TracingSession, UsageTracking};
pub use lookup::{dispatch, forward, is_active, lookup};
pub use propagate::AmbientFutureExt;
pub use slot::{AmbientSlot, Previous};

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
