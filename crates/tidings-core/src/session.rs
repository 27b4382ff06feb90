//! Per-connection session: handshake, then keep-alive.
//!
//! The handshake delivers, in order:
//!
//! ```text
//! status:loading -> (join) -> status:fetching -> data -> status:ready
//!                                             \-> error -> status:error
//! ```
//!
//! After that the session only waits for the connection to close. Inbound
//! messages are read and discarded.

use crate::hub::Hub;
use std::sync::Arc;
use tidings_protocol::{Envelope, Status};
use tidings_transport::{Connection, Inbound, TransportError};
use tracing::{debug, trace, warn};

/// How a session's handshake ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The initial snapshot was delivered.
    Ready,
    /// The initial fetch failed and the client was told so.
    Failed,
    /// The transport failed before the handshake completed.
    Disconnected,
}

impl SessionOutcome {
    /// Label for metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionOutcome::Ready => "ready",
            SessionOutcome::Failed => "failed",
            SessionOutcome::Disconnected => "disconnected",
        }
    }
}

/// Run the handshake for a connection joining `channel`.
///
/// Leaves the connection subscribed on return, whatever the outcome.
///
/// # Errors
///
/// Returns the transport error if any send fails.
pub async fn handshake(
    hub: &Hub,
    channel: &str,
    connection: &Arc<dyn Connection>,
) -> Result<SessionOutcome, TransportError> {
    let registry = hub.registry();

    registry
        .send_to(
            connection.as_ref(),
            &Envelope::status(Status::Loading, "Connecting to channel"),
        )
        .await?;
    registry.join(channel, connection);
    registry
        .send_to(
            connection.as_ref(),
            &Envelope::status(Status::Fetching, "Fetching initial data"),
        )
        .await?;

    let Some(request) = hub.resolver().resolve(channel) else {
        debug!(channel = %channel, "Unroutable channel, sending empty snapshot");
        registry
            .send_to(connection.as_ref(), &Envelope::empty_data())
            .await?;
        registry
            .send_to(
                connection.as_ref(),
                &Envelope::status(Status::Ready, "Data loaded"),
            )
            .await?;
        return Ok(SessionOutcome::Ready);
    };

    match hub.fetch(&request).await {
        Ok(content) => {
            registry
                .send_to(connection.as_ref(), &content.into_envelope())
                .await?;
            registry
                .send_to(
                    connection.as_ref(),
                    &Envelope::status(Status::Ready, request.loaded_message()),
                )
                .await?;
            Ok(SessionOutcome::Ready)
        }
        Err(e) => {
            warn!(
                channel = %channel,
                request = %request,
                error = %e,
                "Initial fetch failed"
            );
            let message = e.to_string();
            registry
                .send_to(connection.as_ref(), &Envelope::error(message.clone()))
                .await?;
            registry
                .send_to(connection.as_ref(), &Envelope::status(Status::Error, message))
                .await?;
            Ok(SessionOutcome::Failed)
        }
    }
}

/// Drive a connection's whole participation in `channel`.
///
/// `on_handshake` is called once the handshake has completed, while the
/// connection is still subscribed. Returns once the connection is closed;
/// the connection is no longer subscribed at that point.
pub async fn run<I, F>(
    hub: &Hub,
    channel: &str,
    connection: Arc<dyn Connection>,
    mut inbound: I,
    on_handshake: F,
) -> SessionOutcome
where
    I: Inbound,
    F: FnOnce(SessionOutcome),
{
    let id = connection.id().clone();

    let outcome = match handshake(hub, channel, &connection).await {
        Ok(outcome) => outcome,
        Err(e) => {
            debug!(channel = %channel, connection = %id, error = %e, "Handshake aborted");
            hub.registry().leave(channel, &id);
            return SessionOutcome::Disconnected;
        }
    };
    on_handshake(outcome);

    loop {
        match inbound.recv().await {
            Ok(Some(text)) => {
                trace!(connection = %id, bytes = text.len(), "Discarding inbound message");
            }
            Ok(None) => {
                debug!(channel = %channel, connection = %id, "Connection closed");
                break;
            }
            Err(e) => {
                debug!(channel = %channel, connection = %id, error = %e, "Receive failed");
                break;
            }
        }
    }

    hub.registry().leave(channel, &id);
    outcome
}
