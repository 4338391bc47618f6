//! Ambient context carried through a call tree
//!
//! An [`AmbientContext`] maps each observer kind to the handle currently
//! active for it. The context is bound with tokio task-local storage, so
//! every task sees its own binding: a worker thread that interleaves
//! unrelated call trees never mixes their observers, and a plain global is
//! never consulted.
//!
//! Cloning a context is cheap (a small map of `Arc`s). Children inherit by
//! receiving a clone (see [`crate::propagate`]), which gives copy-on-branch
//! semantics: a child that installs its own handle shadows the parent's
//! without touching it.

use crate::kind::ObserverKind;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::futures::TaskLocalFuture;

type ErasedHandle = Arc<dyn Any + Send + Sync>;

tokio::task_local! {
    static AMBIENT: RefCell<AmbientContext>;
}

/// Binding ids start at 1; 0 marks a context that was never bound
static NEXT_BINDING: AtomicU64 = AtomicU64::new(1);

/// The set of observers active for one logical call tree
#[derive(Clone, Default)]
pub struct AmbientContext {
    slots: HashMap<TypeId, (&'static str, ErasedHandle)>,
    binding: u64,
}

impl AmbientContext {
    /// Create an empty context with no active observers
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the context bound to the current task, if any
    pub fn current() -> Option<Self> {
        AMBIENT.try_with(|ctx| ctx.borrow().clone()).ok()
    }

    /// Snapshot the current context, or an empty one outside any scope
    pub fn current_or_default() -> Self {
        Self::current().unwrap_or_default()
    }

    /// Whether the current task runs inside an ambient scope
    pub fn is_bound() -> bool {
        AMBIENT.try_with(|_| ()).is_ok()
    }

    /// Get the handle stored for `K`
    pub fn get<K: ObserverKind>(&self) -> Option<Arc<K::Handle>> {
        let (_, handle) = self.slots.get(&TypeId::of::<K>())?;
        Arc::clone(handle).downcast::<K::Handle>().ok()
    }

    /// Replace the handle stored for `K`, returning the previous one
    ///
    /// Passing `None` clears the slot.
    pub fn set<K: ObserverKind>(
        &mut self,
        handle: Option<Arc<K::Handle>>,
    ) -> Option<Arc<K::Handle>> {
        let previous = match handle {
            Some(handle) => {
                let erased: ErasedHandle = handle;
                self.slots.insert(TypeId::of::<K>(), (K::NAME, erased))
            }
            None => self.slots.remove(&TypeId::of::<K>()),
        };
        previous.and_then(|(_, handle)| handle.downcast::<K::Handle>().ok())
    }

    /// Builder form of [`set`](Self::set)
    pub fn with_handle<K: ObserverKind>(mut self, handle: Arc<K::Handle>) -> Self {
        self.set::<K>(Some(handle));
        self
    }

    /// Whether an observer of kind `K` is active in this context
    pub fn contains<K: ObserverKind>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<K>())
    }

    /// Number of active observer kinds
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no observer is active
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Run `future` with this context bound as the ambient one
    ///
    /// The binding is visible only to `future` and is dropped with it, so
    /// the caller's own binding is never modified.
    pub fn scope<F: Future>(self, future: F) -> TaskLocalFuture<RefCell<AmbientContext>, F> {
        AMBIENT.scope(RefCell::new(self.rebind()), future)
    }

    /// Run `f` with this context bound as the ambient one
    pub fn sync_scope<R>(self, f: impl FnOnce() -> R) -> R {
        AMBIENT.sync_scope(RefCell::new(self.rebind()), f)
    }

    /// Identity of the binding this context was bound under
    ///
    /// Every `scope`/`sync_scope` gets a fresh id, including scopes that
    /// bind a clone of an already bound context.
    pub(crate) fn binding(&self) -> u64 {
        self.binding
    }

    fn rebind(mut self) -> Self {
        self.binding = NEXT_BINDING.fetch_add(1, Ordering::Relaxed);
        self
    }
}

impl fmt::Debug for AmbientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&'static str> = self.slots.values().map(|(name, _)| *name).collect();
        kinds.sort_unstable();
        f.debug_struct("AmbientContext")
            .field("kinds", &kinds)
            .finish()
    }
}

/// Read the bound context without cloning it
pub(crate) fn with_bound<R>(f: impl FnOnce(&AmbientContext) -> R) -> Option<R> {
    AMBIENT.try_with(|ctx| f(&*ctx.borrow())).ok()
}

/// Mutate the bound context in place
///
/// Callers must not run user code inside `f`: the binding stays borrowed
/// for the duration of the closure.
pub(crate) fn with_bound_mut<R>(f: impl FnOnce(&mut AmbientContext) -> R) -> Option<R> {
    AMBIENT.try_with(|ctx| f(&mut *ctx.borrow_mut())).ok()
}
