//! WebSocket transport implementation.
//!
//! Adapts an upgraded axum [`WebSocket`] into the [`Connection`] / [`Inbound`]
//! halves used by the registry and sessions.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::traits::{Connection, ConnectionId, Inbound, TransportError};

/// Split an upgraded WebSocket into its send and receive halves.
#[must_use]
pub fn split(socket: WebSocket) -> (Arc<WebSocketConnection>, WebSocketInbound) {
    let (sink, stream) = socket.split();
    let open = Arc::new(AtomicBool::new(true));
    let id = ConnectionId::generate();

    let connection = WebSocketConnection {
        id: id.clone(),
        sink: Mutex::new(sink),
        open: Arc::clone(&open),
    };
    let inbound = WebSocketInbound { id, stream, open };

    (Arc::new(connection), inbound)
}

/// The send half of a WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WebSocket, Message>>,
    open: Arc<AtomicBool>,
}

#[async_trait]
impl Connection for WebSocketConnection {
    fn id(&self) -> &ConnectionId {
        &self.id
    }

    async fn send_raw(&self, text: Arc<str>) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::ConnectionClosed);
        }

        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(text.to_string()))
            .await
            .map_err(|e| {
                self.open.store(false, Ordering::SeqCst);
                TransportError::SendFailed(e.to_string())
            })
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// The receive half of a WebSocket connection.
pub struct WebSocketInbound {
    id: ConnectionId,
    stream: SplitStream<WebSocket>,
    open: Arc<AtomicBool>,
}

#[async_trait]
impl Inbound for WebSocketInbound {
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(String::from_utf8_lossy(&data).into_owned()));
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                    // Pongs are queued by the socket itself
                }
                Some(Ok(Message::Close(_))) => {
                    debug!(connection = %self.id, "Received close frame");
                    self.open.store(false, Ordering::SeqCst);
                    return Ok(None);
                }
                Some(Err(e)) => {
                    warn!(connection = %self.id, error = %e, "WebSocket error");
                    self.open.store(false, Ordering::SeqCst);
                    return Err(TransportError::ReceiveFailed(e.to_string()));
                }
                None => {
                    debug!(connection = %self.id, "WebSocket stream ended");
                    self.open.store(false, Ordering::SeqCst);
                    return Ok(None);
                }
            }
        }
    }
}
