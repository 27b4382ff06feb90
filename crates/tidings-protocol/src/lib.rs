//! # tidings-protocol
//!
//! Wire protocol definitions for the Tidings broadcast engine.
//!
//! Every message pushed to a client is a JSON text frame carrying one
//! [`Envelope`]:
//!
//! - `data` - a full content snapshot (listing, article or live feed)
//! - `status` - a lifecycle update (`loading`, `fetching`, `syncing`, `ready`, `error`)
//! - `error` - a human-readable failure description
//!
//! ## Example
//!
//! ```rust
//! use tidings_protocol::{codec, Envelope, Status};
//!
//! let envelope = Envelope::status(Status::Loading, "Connecting to channel");
//! let text = codec::encode(&envelope).unwrap();
//! let decoded = codec::decode(&text).unwrap();
//! assert_eq!(envelope, decoded);
//! ```

pub mod codec;
pub mod envelope;
pub mod models;
pub mod status;

pub use codec::{decode, encode, ProtocolError};
pub use envelope::{Envelope, EnvelopeType};
pub use models::{ArticleDetail, Headline, LiveTv};
pub use status::{Status, StatusEvent};
