//! Error types for etcd-session-core
//!
//! These errors never cross the CRUD boundary of the store; they exist so the
//! fail-open wrapper can log one precise cause per failed operation. Only
//! [`crate::EtcdStore::start`] returns one to its caller.

use crate::serializer::SerializationError;
use etcd_session_kv::KvError;
use thiserror::Error;

/// Store error type
#[derive(Debug, Error)]
pub enum StoreError {
    /// The remote call failed or answered unsuccessfully
    #[error("remote error: {0}")]
    Remote(#[from] KvError),

    /// A stored value is not valid base64
    #[error("decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The serializer could not produce or reconstruct a session
    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// A stored node carried no value
    #[error("no value stored at {0}")]
    MissingValue(String),

    /// No session manager (and therefore no serializer) is configured
    #[error("no session manager configured")]
    NoManager,

    /// The store has no remote client yet
    #[error("store not started")]
    NotStarted,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;
