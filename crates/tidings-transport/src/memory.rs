//! In-process transport.
//!
//! [`pair`] returns a connection usable anywhere a real transport is, plus a
//! [`MemoryClient`] playing the remote peer: it reads what the server sent,
//! sends inbound text, closes the connection or makes subsequent sends fail.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tidings_protocol::{codec, Envelope};
use tokio::sync::mpsc;

use crate::traits::{Connection, ConnectionId, Inbound, TransportError};

#[derive(Debug)]
struct Shared {
    open: AtomicBool,
    failing: AtomicBool,
}

/// Create a connected in-memory pair.
#[must_use]
pub fn pair(
    id: impl Into<ConnectionId>,
) -> (Arc<dyn Connection>, MemoryInbound, MemoryClient) {
    let shared = Arc::new(Shared {
        open: AtomicBool::new(true),
        failing: AtomicBool::new(false),
    });
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (in_tx, in_rx) = mpsc::unbounded_channel();

    let connection: Arc<dyn Connection> = Arc::new(MemoryConnection {
        id: id.into(),
        outbox: out_tx,
        shared: Arc::clone(&shared),
    });
    let inbound = MemoryInbound { inbox: in_rx };
    let client = MemoryClient {
        outbox: out_rx,
        inbox: Some(in_tx),
        shared,
    };

    (connection, inbound, client)
}

/// The server side of an in-memory connection.
pub struct MemoryConnection {
    id: ConnectionId,
    outbox: mpsc::UnboundedSender<Arc<str>>,
    shared: Arc<Shared>,
}

#[async_trait]
impl Connection for MemoryConnection {
    fn id(&self) -> &ConnectionId {
        &self.id
    }

    async fn send_raw(&self, text: Arc<str>) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::ConnectionClosed);
        }
        if self.shared.failing.load(Ordering::SeqCst) {
            return Err(TransportError::SendFailed("injected failure".into()));
        }
        self.outbox
            .send(text)
            .map_err(|_| TransportError::ConnectionClosed)
    }

    fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }
}

/// The receive half of an in-memory connection.
pub struct MemoryInbound {
    inbox: mpsc::UnboundedReceiver<Result<String, TransportError>>,
}

#[async_trait]
impl Inbound for MemoryInbound {
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        match self.inbox.recv().await {
            Some(Ok(text)) => Ok(Some(text)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

/// The remote peer of an in-memory connection.
pub struct MemoryClient {
    outbox: mpsc::UnboundedReceiver<Arc<str>>,
    inbox: Option<mpsc::UnboundedSender<Result<String, TransportError>>>,
    shared: Arc<Shared>,
}

impl MemoryClient {
    /// Send a text message to the server.
    pub fn send_text(&self, text: impl Into<String>) {
        if let Some(inbox) = &self.inbox {
            let _ = inbox.send(Ok(text.into()));
        }
    }

    /// Deliver a receive error to the server.
    pub fn inject_receive_error(&self, reason: impl Into<String>) {
        if let Some(inbox) = &self.inbox {
            let _ = inbox.send(Err(TransportError::ReceiveFailed(reason.into())));
        }
    }

    /// Make every following server send fail.
    pub fn fail_sends(&self) {
        self.shared.failing.store(true, Ordering::SeqCst);
    }

    /// Close the connection from the client side.
    pub fn close(&mut self) {
        self.shared.open.store(false, Ordering::SeqCst);
        self.inbox = None;
    }

    /// Wait for the next envelope sent by the server.
    ///
    /// Returns `None` once the server side is gone and everything was read.
    pub async fn next_envelope(&mut self) -> Option<Envelope> {
        let text = self.outbox.recv().await?;
        codec::decode(&text).ok()
    }

    /// All envelopes sent so far that have not been read yet.
    pub fn drain(&mut self) -> Vec<Envelope> {
        let mut envelopes = Vec::new();
        while let Ok(text) = self.outbox.try_recv() {
            if let Ok(envelope) = codec::decode(&text) {
                envelopes.push(envelope);
            }
        }
        envelopes
    }
}
