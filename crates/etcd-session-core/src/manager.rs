//! Session manager seam
//!
//! The host session manager creates sessions, owns the request pipeline and
//! supplies the serializer the store must use for its sessions.

use crate::pipeline::Valve;
use crate::serializer::{JsonSessionSerializer, SessionSerializer};
use crate::session::Session;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Host session manager capabilities consumed by the store
pub trait SessionManager: Send + Sync {
    /// Manager name, also the session type its serializer accepts
    fn name(&self) -> &str;

    /// Create a new, empty session with the given identifier
    fn create_session(&self, id: &str) -> Session;

    /// The serializer bound to this manager
    fn session_serializer(&self) -> Arc<dyn SessionSerializer>;

    /// Valves of the request-completion pipeline, in order
    fn valves(&self) -> Vec<Arc<dyn Valve>>;
}

/// Default session manager
pub struct StandardManager {
    name: String,
    max_inactive_interval: Option<u64>,
    valves: RwLock<Vec<Arc<dyn Valve>>>,
}

impl Default for StandardManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardManager {
    /// Create a manager named `StandardManager` with no pipeline
    #[must_use]
    pub fn new() -> Self {
        Self::with_name("StandardManager")
    }

    /// Create a manager with a custom name
    #[must_use]
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_inactive_interval: None,
            valves: RwLock::new(Vec::new()),
        }
    }

    /// Set the inactivity timeout applied to created sessions
    #[must_use]
    pub fn with_max_inactive_interval(mut self, secs: u64) -> Self {
        self.max_inactive_interval = Some(secs);
        self
    }

    /// Append a valve to the pipeline
    pub fn add_valve(&self, valve: Arc<dyn Valve>) {
        debug!(manager = %self.name, valve = %valve.name(), "Adding valve to pipeline");
        self.valves
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(valve);
    }
}

impl SessionManager for StandardManager {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_session(&self, id: &str) -> Session {
        let session = Session::new(id);
        match self.max_inactive_interval {
            Some(secs) => session.with_max_inactive_interval(secs),
            None => session,
        }
    }

    fn session_serializer(&self) -> Arc<dyn SessionSerializer> {
        Arc::new(JsonSessionSerializer::new(self.name.clone()))
    }

    fn valves(&self) -> Vec<Arc<dyn Valve>> {
        self.valves
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SessionFlushValve;

    #[test]
    fn test_create_session_applies_timeout() {
        let manager = StandardManager::new().with_max_inactive_interval(1800);
        let session = manager.create_session("abc");
        assert_eq!(session.id(), "abc");
        assert!(session.is_new());
        assert_eq!(session.max_inactive_interval, Some(1800));
    }

    #[test]
    fn test_serializer_is_bound_to_manager_name() {
        let first = StandardManager::with_name("first");
        let second = StandardManager::with_name("second");

        let bytes = first
            .session_serializer()
            .serialize(&Session::new("abc"))
            .unwrap();
        assert!(first.session_serializer().deserialize(&bytes).is_ok());
        assert!(second.session_serializer().deserialize(&bytes).is_err());
    }

    #[test]
    fn test_valves_in_order() {
        let manager = StandardManager::new();
        manager.add_valve(Arc::new(SessionFlushValve::new()));
        manager.add_valve(Arc::new(SessionFlushValve::new()));
        assert_eq!(manager.valves().len(), 2);
    }
}
