//! Transport abstraction traits for Tidings.
//!
//! These traits define what the registry and sessions need from a transport,
//! keeping both independent of the wire technology.

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tidings_protocol::{codec, Envelope};

/// Counter disambiguating connections accepted within the same nanosecond.
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    /// Create a new connection ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a unique connection ID.
    #[must_use]
    pub fn generate() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("conn_{:x}_{:x}", timestamp, counter))
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ConnectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection was closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Failed to send data.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Failed to receive data.
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// Envelope could not be encoded.
    #[error("Protocol error: {0}")]
    Protocol(#[from] tidings_protocol::ProtocolError),
}

/// The send half of an active connection.
///
/// Implementations must be safe to call from several tasks at once and must
/// deliver concurrent sends one at a time, in call order.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the connection's unique identifier.
    fn id(&self) -> &ConnectionId;

    /// Send pre-encoded envelope text.
    ///
    /// Broadcasts encode once and share the text across all subscribers.
    async fn send_raw(&self, text: Arc<str>) -> Result<(), TransportError>;

    /// Encode and send an envelope.
    async fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let text = codec::encode(envelope)?;
        self.send_raw(Arc::from(text)).await
    }

    /// Check if the connection is still open.
    fn is_open(&self) -> bool;
}

/// The receive half of an active connection.
#[async_trait]
pub trait Inbound: Send {
    /// Receive the next text message from the peer.
    ///
    /// Returns `None` once the connection is closed cleanly.
    async fn recv(&mut self) -> Result<Option<String>, TransportError>;
}
