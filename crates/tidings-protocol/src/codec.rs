//! Codec for encoding and decoding Tidings envelopes.
//!
//! Envelopes travel as JSON text, one envelope per transport message.

use thiserror::Error;

use crate::envelope::Envelope;

/// Maximum encoded envelope size (16 MiB).
pub const MAX_ENVELOPE_SIZE: usize = 16 * 1024 * 1024;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Envelope exceeds maximum size.
    #[error("Envelope size {0} exceeds maximum {MAX_ENVELOPE_SIZE}")]
    EnvelopeTooLarge(usize),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode an envelope to JSON text.
///
/// # Errors
///
/// Returns an error if the envelope is too large or encoding fails.
pub fn encode(envelope: &Envelope) -> Result<String, ProtocolError> {
    let text = serde_json::to_string(envelope)?;

    if text.len() > MAX_ENVELOPE_SIZE {
        return Err(ProtocolError::EnvelopeTooLarge(text.len()));
    }

    Ok(text)
}

/// Decode an envelope from JSON text.
///
/// # Errors
///
/// Returns an error if the text is too large or not a valid envelope.
pub fn decode(text: &str) -> Result<Envelope, ProtocolError> {
    if text.len() > MAX_ENVELOPE_SIZE {
        return Err(ProtocolError::EnvelopeTooLarge(text.len()));
    }

    Ok(serde_json::from_str(text)?)
}
