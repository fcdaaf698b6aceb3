//! Etcd Session Core - Durable session persistence
//!
//! This crate provides the persistence store a host session manager uses to
//! keep sessions in etcd:
//! - Store: CRUD over the `sessions/` namespace with fail-open degradation
//! - Lifecycle: init/start/stop with lazy, non-reconstructing client handle
//! - Notify: change notification for host, port and manager
//! - Session, serializer, manager and pipeline: the host collaborator seams
//!
//! No store operation ever returns an error to the request path. Failures are
//! logged and converted to a safe default (a fresh session, a no-op, an absent
//! key listing or the [`SIZE_UNKNOWN`] sentinel).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod manager;
pub mod notify;
pub mod pipeline;
pub mod serializer;
pub mod session;
pub mod store;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use lifecycle::{Lifecycle, LifecycleState, Transition};
pub use manager::{SessionManager, StandardManager};
pub use notify::{
    Property, PropertyChangeEvent, PropertyChangeListener, PropertyChangeSupport, PropertyValue,
};
pub use pipeline::{SessionFlushValve, Valve};
pub use serializer::{JsonSessionSerializer, SerializationError, SessionSerializer};
pub use session::Session;
pub use store::{
    session_key, ClientFactory, EtcdStore, SessionStore, StoreManagement, SESSIONS_KEY,
    SIZE_UNKNOWN,
};

pub use etcd_session_kv::{KvClient, KvError, KvNode};
