//! Lifecycle status vocabulary.
//!
//! Status values are communication-only: the server never branches on them,
//! clients use them to drive loading indicators.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp layout used on the wire (UTC, microsecond precision, no offset).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Lifecycle status of a channel as seen by one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Connection accepted, joining the channel.
    Loading,
    /// Initial snapshot is being fetched.
    Fetching,
    /// A scheduled refresh is in progress.
    Syncing,
    /// The latest snapshot has been delivered.
    Ready,
    /// The last fetch failed.
    Error,
}

impl Status {
    /// Wire name of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Loading => "loading",
            Status::Fetching => "fetching",
            Status::Syncing => "syncing",
            Status::Ready => "ready",
            Status::Error => "error",
        }
    }

    /// Whether this status ends a fetch cycle.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Ready | Status::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a `status` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Lifecycle status.
    pub status: Status,
    /// Optional human-readable detail. Serialized as `null` when absent.
    pub message: Option<String>,
    /// ISO-8601 timestamp assigned by the sender.
    pub timestamp: String,
}

impl StatusEvent {
    /// Create a status event stamped with the current time.
    #[must_use]
    pub fn now(status: Status, message: Option<String>) -> Self {
        Self {
            status,
            message,
            timestamp: current_timestamp(),
        }
    }
}

/// Current UTC time in the wire timestamp layout.
#[must_use]
pub fn current_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}
