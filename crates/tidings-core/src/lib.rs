//! # tidings-core
//!
//! Channel registry and broadcast engine for the Tidings realtime news feed.
//!
//! This crate provides the building blocks:
//!
//! - **Channel** - channel identifier grammar and content request resolution
//! - **Registry** - channel -> subscriber routing with best-effort fan-out
//! - **Provider** - the content provider seam and its timeout decorator
//! - **Session** - per-connection handshake and keep-alive loop
//! - **Scheduler** - recurring refresh of every subscribed channel kind
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Session   │────▶│  Registry   │◀────│  Scheduler  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        │            ┌─────────────┐            │
//!        └───────────▶│  Provider   │◀───────────┘
//!                     └─────────────┘
//! ```

pub mod channel;
pub mod hub;
pub mod provider;
pub mod registry;
pub mod scheduler;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use channel::{ChannelId, ContentRequest, Listing, Resolver};
pub use hub::Hub;
pub use provider::{Content, ContentProvider, FetchError, ProviderError, TimeoutProvider};
pub use registry::{Registry, RegistryStats};
pub use scheduler::{refresh_once, RefreshReport, RefreshScheduler};
pub use session::SessionOutcome;
