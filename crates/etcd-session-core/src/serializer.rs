//! Session serialization
//!
//! The store never interprets session bytes; it asks the serializer bound to
//! the current manager to produce and consume them.

use crate::session::Session;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Serialization errors
#[derive(Debug, Error)]
pub enum SerializationError {
    /// I/O fault while reading or writing bytes
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The payload names a session type this serializer cannot reconstruct
    #[error("unknown session type: {0}")]
    UnknownType(String),

    /// The payload is not a valid session
    #[error("malformed session data: {0}")]
    Malformed(String),
}

/// Converts sessions to and from bytes
pub trait SessionSerializer: Send + Sync {
    /// Serialize a session
    fn serialize(&self, session: &Session) -> Result<Vec<u8>, SerializationError>;

    /// Reconstruct a session
    fn deserialize(&self, bytes: &[u8]) -> Result<Session, SerializationError>;
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    session: &'a Session,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    session: serde_json::Value,
}

/// JSON serializer bound to one session type
///
/// Payloads are tagged with the type of the manager that wrote them; a payload
/// written under another type is rejected with
/// [`SerializationError::UnknownType`].
#[derive(Debug, Clone)]
pub struct JsonSessionSerializer {
    session_type: String,
}

impl JsonSessionSerializer {
    /// Create a serializer for the given session type
    #[must_use]
    pub fn new(session_type: impl Into<String>) -> Self {
        Self {
            session_type: session_type.into(),
        }
    }

    /// Session type this serializer reads and writes
    #[must_use]
    pub fn session_type(&self) -> &str {
        &self.session_type
    }
}

impl SessionSerializer for JsonSessionSerializer {
    fn serialize(&self, session: &Session) -> Result<Vec<u8>, SerializationError> {
        let envelope = EnvelopeRef {
            kind: &self.session_type,
            session,
        };
        let mut bytes = Vec::new();
        serde_json::to_writer(&mut bytes, &envelope).map_err(std::io::Error::from)?;
        Ok(bytes)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Session, SerializationError> {
        let envelope: Envelope = serde_json::from_slice(bytes)
            .map_err(|e| SerializationError::Malformed(e.to_string()))?;

        match envelope.kind.as_deref() {
            Some(kind) if kind == self.session_type => {}
            Some(kind) => return Err(SerializationError::UnknownType(kind.to_string())),
            None => return Err(SerializationError::UnknownType("<missing>".to_string())),
        }

        serde_json::from_value(envelope.session)
            .map_err(|e| SerializationError::Malformed(e.to_string()))
    }
}
