//! # tidings-transport
//!
//! Connection abstraction layer for the Tidings broadcast engine.
//!
//! A connection is split into two halves:
//!
//! - [`Connection`] - the shareable send half. The channel registry keeps
//!   non-owning references to it for fan-out.
//! - [`Inbound`] - the receive half, owned by the session driving the
//!   connection's keep-alive loop.
//!
//! ## Transports
//!
//! - **WebSocket** - axum WebSocket upgrade (feature `websocket`, default)
//! - **Memory** - in-process pair for tests and benchmarks
//!
//! ```rust,ignore
//! use tidings_transport::{Connection, Inbound};
//!
//! async fn drain(mut inbound: impl Inbound) {
//!     while let Ok(Some(_text)) = inbound.recv().await {
//!         // Inbound messages are ignored
//!     }
//! }
//! ```

pub mod memory;
pub mod traits;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use traits::{Connection, ConnectionId, Inbound, TransportError};

#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketInbound};
