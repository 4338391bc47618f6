//! Observer kinds and the handler interface they share
//!
//! Every class of ambient observer is identified by a zero-sized marker type
//! implementing [`ObserverKind`]. The marker names the handle type stored in
//! the ambient slot, so each kind gets its own isolated slot and lookups are
//! statically typed.
//!
//! # Defining a kind
//!
//! ```rust
//! use langgraph_callbacks::{CallbackHandler, ObserverKind, RunEvent};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct EventCounter(AtomicUsize);
//!
//! impl CallbackHandler for EventCounter {
//!     fn on_event(&self, _event: &RunEvent) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! struct Counting;
//!
//! impl ObserverKind for Counting {
//!     type Handle = EventCounter;
//!     const NAME: &'static str = "counting";
//! }
//! ```

use crate::event::RunEvent;
use crate::handlers::{RunCollector, TracerSession, UsageTracker};

/// Receives lifecycle events while installed as an ambient observer
///
/// Handles are shared by every call in the tree that looks them up, so they
/// are called concurrently and must synchronize their own state.
pub trait CallbackHandler: Send + Sync {
    /// Called once per lifecycle event while the handle is active
    fn on_event(&self, event: &RunEvent);
}

/// Identity of a class of ambient observer
pub trait ObserverKind: 'static {
    /// Concrete observer stored in the slot for this kind
    type Handle: CallbackHandler + 'static;

    /// Name used in diagnostics
    const NAME: &'static str;
}

/// Token and cost accounting
#[derive(Debug, Clone, Copy)]
pub struct UsageTracking;

impl ObserverKind for UsageTracking {
    type Handle = UsageTracker;
    const NAME: &'static str = "usage_tracking";
}

/// Tracing session binding
#[derive(Debug, Clone, Copy)]
pub struct TracingSession;

impl ObserverKind for TracingSession {
    type Handle = TracerSession;
    const NAME: &'static str = "tracing_session";
}

/// Run collection buffer
#[derive(Debug, Clone, Copy)]
pub struct RunCollection;

impl ObserverKind for RunCollection {
    type Handle = RunCollector;
    const NAME: &'static str = "run_collection";
}
