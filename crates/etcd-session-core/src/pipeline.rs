//! Request-completion pipeline
//!
//! The store wires itself into the [`SessionFlushValve`] during `init`; the
//! valve then persists the request's session once the request completes.

use crate::session::Session;
use crate::store::SessionStore;
use std::sync::{PoisonError, RwLock, Weak};
use tracing::debug;

/// A stage of the request-completion pipeline
pub trait Valve: Send + Sync {
    /// Valve name (for logging)
    fn name(&self) -> &str;

    /// Downcast to a flush valve
    fn as_session_flush(&self) -> Option<&SessionFlushValve> {
        None
    }
}

/// Valve that saves the request's session to the backing store
///
/// Holds the store weakly: the host owns the store, the valve only uses it.
#[derive(Default)]
pub struct SessionFlushValve {
    store: RwLock<Option<Weak<dyn SessionStore>>>,
}

impl SessionFlushValve {
    /// Create a valve with no backing store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backing store
    pub fn set_store(&self, store: Weak<dyn SessionStore>) {
        *self.store.write().unwrap_or_else(PoisonError::into_inner) = Some(store);
    }

    /// Whether a live backing store is wired
    #[must_use]
    pub fn has_store(&self) -> bool {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|store| store.strong_count() > 0)
    }

    /// Persist the request's session, if any
    pub fn flush(&self, session: Option<&Session>) {
        let Some(session) = session else {
            return;
        };
        let store = self
            .store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade);

        match store {
            Some(store) => store.save(session),
            None => debug!(session_id = %session.id(), "No backing store wired; session not flushed"),
        }
    }
}

impl Valve for SessionFlushValve {
    fn name(&self) -> &str {
        "SessionFlushValve"
    }

    fn as_session_flush(&self) -> Option<&SessionFlushValve> {
        Some(self)
    }
}
