//! Envelope types for the Tidings protocol.
//!
//! Envelopes are the only messages the server pushes to a connection. Each is
//! serialized as a JSON object discriminated by its `type` field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::ProtocolError;
use crate::status::{Status, StatusEvent};

/// Envelope type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeType {
    Data,
    Status,
    Error,
}

impl EnvelopeType {
    /// Wire name of the envelope type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeType::Data => "data",
            EnvelopeType::Status => "status",
            EnvelopeType::Error => "error",
        }
    }
}

/// A message delivered to a connection.
///
/// ```json
/// {"type": "data", "data": [...]}
/// {"type": "status", "data": {"status": "ready", "message": null, "timestamp": "..."}}
/// {"type": "error", "error": "Article not found"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    /// A full content snapshot. Always a replacement, never a delta.
    Data {
        /// Listing array, article object or live feed object.
        data: Value,
    },

    /// A lifecycle status update.
    Status {
        /// Status payload.
        data: StatusEvent,
    },

    /// A failure description.
    Error {
        /// Human-readable error message.
        error: String,
    },
}

impl Envelope {
    /// Get the envelope type.
    #[must_use]
    pub fn envelope_type(&self) -> EnvelopeType {
        match self {
            Envelope::Data { .. } => EnvelopeType::Data,
            Envelope::Status { .. } => EnvelopeType::Status,
            Envelope::Error { .. } => EnvelopeType::Error,
        }
    }

    /// Create a new Data envelope.
    #[must_use]
    pub fn data(data: Value) -> Self {
        Envelope::Data { data }
    }

    /// Create a Data envelope from any serializable payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be represented as JSON.
    pub fn data_from<T: Serialize + ?Sized>(payload: &T) -> Result<Self, ProtocolError> {
        Ok(Envelope::Data {
            data: serde_json::to_value(payload)?,
        })
    }

    /// Create a Data envelope carrying an empty listing.
    #[must_use]
    pub fn empty_data() -> Self {
        Envelope::Data {
            data: Value::Array(Vec::new()),
        }
    }

    /// Create a Status envelope stamped with the current time.
    #[must_use]
    pub fn status(status: Status, message: impl Into<String>) -> Self {
        Envelope::Status {
            data: StatusEvent::now(status, Some(message.into())),
        }
    }

    /// Create a Status envelope without a message.
    #[must_use]
    pub fn bare_status(status: Status) -> Self {
        Envelope::Status {
            data: StatusEvent::now(status, None),
        }
    }

    /// Create a new Error envelope.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Envelope::Error {
            error: message.into(),
        }
    }

    /// The status carried by a Status envelope.
    #[must_use]
    pub fn status_value(&self) -> Option<Status> {
        match self {
            Envelope::Status { data } => Some(data.status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_wire_shape() {
        let envelope = Envelope::data(json!([{"topic": "X"}]));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"type": "data", "data": [{"topic": "X"}]})
        );
    }

    #[test]
    fn test_status_wire_shape() {
        let envelope = Envelope::Status {
            data: StatusEvent {
                status: Status::Ready,
                message: None,
                timestamp: "2024-05-01T10:00:00.000000".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "type": "status",
                "data": {
                    "status": "ready",
                    "message": null,
                    "timestamp": "2024-05-01T10:00:00.000000"
                }
            })
        );
    }

    #[test]
    fn test_error_wire_shape() {
        let envelope = Envelope::error("Article not found");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"type": "error", "error": "Article not found"})
        );
        assert_eq!(envelope.envelope_type(), EnvelopeType::Error);
    }

    #[test]
    fn test_status_value() {
        assert_eq!(
            Envelope::status(Status::Fetching, "Fetching initial data").status_value(),
            Some(Status::Fetching)
        );
        assert_eq!(Envelope::empty_data().status_value(), None);
    }
}
