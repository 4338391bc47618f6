//! Ambient slot: install, read and restore a handle for one observer kind
//!
//! These are the raw bookkeeping operations the activation shapes in
//! [`crate::activation`] are built on. They never block, never await and
//! never notify observers.
//!
//! [`AmbientSlot::install`] returns a [`Previous`] token holding the value it
//! replaced. Handing that token back to [`AmbientSlot::restore`] reverses the
//! install exactly, which keeps nested activations of the same kind
//! symmetric. Tokens must be restored in LIFO order; restoring out of order
//! is a caller bug and trips a debug assertion.

use crate::context::{with_bound, with_bound_mut};
use crate::error::{CallbackError, Result};
use crate::kind::ObserverKind;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{error, trace};

/// Typed access to the ambient slot of kind `K`
pub struct AmbientSlot<K: ObserverKind> {
    _kind: PhantomData<K>,
}

impl<K: ObserverKind> AmbientSlot<K> {
    /// Install `handle` as the active observer of kind `K`
    ///
    /// Overwrites whatever was active and returns it inside the restore
    /// token. Fails only when no ambient context is bound to the current
    /// task, since there is nothing call-tree scoped to install into.
    pub fn install(handle: Arc<K::Handle>) -> Result<Previous<K>> {
        let installed = Arc::clone(&handle);
        let (value, binding) = with_bound_mut(|ctx| (ctx.set::<K>(Some(handle)), ctx.binding()))
            .ok_or(CallbackError::NoAmbientContext { kind: K::NAME })?;

        trace!(
            kind = K::NAME,
            binding,
            replaced = value.is_some(),
            "Installed ambient observer"
        );

        Ok(Previous {
            value,
            installed,
            binding,
        })
    }

    /// The active observer of kind `K`, if any
    ///
    /// Absence is the normal outcome when nothing was installed.
    pub fn read() -> Option<Arc<K::Handle>> {
        with_bound(|ctx| ctx.get::<K>()).flatten()
    }

    /// Whether an observer of kind `K` is active
    pub fn is_active() -> bool {
        with_bound(|ctx| ctx.contains::<K>()).unwrap_or(false)
    }

    /// Reverse the install that produced `previous`
    ///
    /// The token only applies to the binding it was issued in. A token
    /// handed back inside a nested scope (or after its scope has ended)
    /// leaves the current binding untouched.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the active handle is not the one that
    /// install put there (interleaved misuse of two activations), or if the
    /// current binding is not the one the token came from, unless the
    /// thread is already unwinding. Release builds log; a same-binding
    /// mismatch is restored anyway.
    pub fn restore(previous: Previous<K>) {
        let Previous {
            value,
            installed,
            binding,
        } = previous;

        let outcome = with_bound_mut(|ctx| {
            if ctx.binding() != binding {
                return RestoreOutcome::ForeignBinding {
                    current: ctx.binding(),
                };
            }
            match ctx.set::<K>(value) {
                Some(current) if Arc::ptr_eq(&current, &installed) => RestoreOutcome::Restored,
                _ => RestoreOutcome::Mismatched,
            }
        });

        match outcome {
            Some(RestoreOutcome::Restored) => {
                trace!(kind = K::NAME, binding, "Restored ambient observer")
            }
            Some(RestoreOutcome::Mismatched) => {
                error!(
                    kind = K::NAME,
                    "Restored an observer that was not the most recent install"
                );
                debug_assert!(
                    std::thread::panicking(),
                    "mismatched restore for observer kind '{}'",
                    K::NAME
                );
            }
            Some(RestoreOutcome::ForeignBinding { current }) => {
                error!(
                    kind = K::NAME,
                    binding,
                    current,
                    "Restore attempted from a different ambient context; observer left installed"
                );
                debug_assert!(
                    std::thread::panicking(),
                    "restore for observer kind '{}' from a different ambient context",
                    K::NAME
                );
            }
            None => {
                error!(
                    kind = K::NAME,
                    "Restore attempted with no ambient context bound"
                );
                debug_assert!(
                    std::thread::panicking(),
                    "restore for observer kind '{}' outside its ambient context",
                    K::NAME
                );
            }
        }
    }
}

enum RestoreOutcome {
    Restored,
    Mismatched,
    ForeignBinding { current: u64 },
}

/// Restore token returned by [`AmbientSlot::install`]
#[must_use = "dropping the token without restoring leaves the observer installed"]
pub struct Previous<K: ObserverKind> {
    value: Option<Arc<K::Handle>>,
    installed: Arc<K::Handle>,
    binding: u64,
}

impl<K: ObserverKind> Previous<K> {
    /// The value that was active before the install
    pub fn value(&self) -> Option<&Arc<K::Handle>> {
        self.value.as_ref()
    }

    /// The handle the install put in place
    pub fn installed(&self) -> &Arc<K::Handle> {
        &self.installed
    }
}

impl<K: ObserverKind> fmt::Debug for Previous<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Previous")
            .field("kind", &K::NAME)
            .field("had_value", &self.value.is_some())
            .field("binding", &self.binding)
            .finish()
    }
}
