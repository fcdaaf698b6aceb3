//! Change notification for store configuration
//!
//! Listeners are called synchronously by the thread that performed the
//! change, after the configuration lock has been released. A listener may
//! therefore read the store (or even reconfigure it) without deadlocking.
//! Concurrent setters may deliver their events in either order.

use crate::manager::SessionManager;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error};

/// Observable store properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Connection host
    Host,
    /// Connection port
    Port,
    /// Session manager reference
    Manager,
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Port => write!(f, "port"),
            Self::Manager => write!(f, "manager"),
        }
    }
}

/// Value carried by a change event
#[derive(Clone)]
pub enum PropertyValue {
    /// Text value (host)
    Text(String),
    /// Port number
    Port(u16),
    /// Manager reference, absent before the first assignment
    Manager(Option<Arc<dyn SessionManager>>),
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.debug_tuple("Text").field(value).finish(),
            Self::Port(port) => f.debug_tuple("Port").field(port).finish(),
            Self::Manager(manager) => f
                .debug_tuple("Manager")
                .field(&manager.as_ref().map(|m| m.name()))
                .finish(),
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Port(a), Self::Port(b)) => a == b,
            (Self::Manager(Some(a)), Self::Manager(Some(b))) => Arc::ptr_eq(a, b),
            (Self::Manager(None), Self::Manager(None)) => true,
            _ => false,
        }
    }
}

/// A committed configuration change
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChangeEvent {
    /// Changed property
    pub property: Property,
    /// Value before the change
    pub previous: PropertyValue,
    /// Value after the change
    pub current: PropertyValue,
}

impl PropertyChangeEvent {
    /// Create a change event
    #[must_use]
    pub fn new(property: Property, previous: PropertyValue, current: PropertyValue) -> Self {
        Self {
            property,
            previous,
            current,
        }
    }
}

/// Receives configuration change events
///
/// Implementations should return promptly; they run on the caller's thread.
pub trait PropertyChangeListener: Send + Sync {
    /// Called once per committed change
    fn property_change(&self, event: &PropertyChangeEvent);
}

impl<F> PropertyChangeListener for F
where
    F: Fn(&PropertyChangeEvent) + Send + Sync,
{
    fn property_change(&self, event: &PropertyChangeEvent) {
        self(event);
    }
}

/// Registry of change listeners
#[derive(Default)]
pub struct PropertyChangeSupport {
    listeners: RwLock<Vec<Arc<dyn PropertyChangeListener>>>,
}

impl PropertyChangeSupport {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn add(&self, listener: Arc<dyn PropertyChangeListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Unregister a listener (by identity); returns whether it was registered
    pub fn remove(&self, listener: &Arc<dyn PropertyChangeListener>) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    /// Number of registered listeners
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no listener is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver an event to every listener
    ///
    /// A panicking listener is logged and skipped; it never affects the other
    /// listeners or the change that was already committed. Returns the number
    /// of listeners that completed normally.
    pub fn notify(&self, event: &PropertyChangeEvent) -> usize {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut delivered = 0;
        for listener in listeners {
            match panic::catch_unwind(AssertUnwindSafe(|| listener.property_change(event))) {
                Ok(()) => delivered += 1,
                Err(_) => error!(property = %event.property, "Property change listener panicked"),
            }
        }

        debug!(property = %event.property, delivered, "Property change notified");
        delivered
    }
}

#[cfg(test)]
mod tests;
