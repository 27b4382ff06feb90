//! Channel registry for Tidings.
//!
//! The registry maps channel identifiers to the connections subscribed to
//! them. Channel entries are created on first join and removed as soon as
//! their last subscriber leaves, so iterating the registry only ever visits
//! channels somebody is listening to.

use crate::channel::ChannelId;
use dashmap::DashMap;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tidings_protocol::{codec, Envelope};
use tidings_transport::{Connection, ConnectionId, TransportError};
use tracing::{debug, error, trace};

/// Subscribers of one channel. Handles are weak: the registry never keeps a
/// connection alive.
type Subscribers = HashMap<ConnectionId, Weak<dyn Connection>>;

/// The channel registry.
///
/// All mutations of a channel happen under that channel's shard lock, and no
/// lock is held across a send.
#[derive(Default)]
pub struct Registry {
    channels: DashMap<ChannelId, Subscribers>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a connection to a channel, creating the channel if needed.
    ///
    /// Joining twice has no additional effect.
    pub fn join(&self, channel: &str, connection: &Arc<dyn Connection>) {
        let id = connection.id().clone();
        let mut subscribers = self.channels.entry(channel.to_string()).or_default();
        let previous = subscribers.insert(id.clone(), Arc::downgrade(connection));

        if previous.is_none() {
            debug!(
                channel = %channel,
                connection = %id,
                subscribers = subscribers.len(),
                "Joined"
            );
        }
    }

    /// Unsubscribe a connection from a channel.
    ///
    /// Deletes the channel when its last subscriber leaves. Leaving a channel
    /// that was never joined is a no-op.
    pub fn leave(&self, channel: &str, connection_id: &ConnectionId) {
        let removed = self.channels.remove_if_mut(channel, |_, subscribers| {
            if subscribers.remove(connection_id).is_some() {
                debug!(channel = %channel, connection = %connection_id, "Left");
            }
            subscribers.is_empty()
        });

        if removed.is_some() {
            debug!(channel = %channel, "Deleted empty channel");
        }
    }

    /// Send an envelope to every current subscriber of a channel.
    ///
    /// Delivery targets are the subscribers present when the call starts.
    /// A subscriber whose send fails is unsubscribed; the remaining sends
    /// proceed. Returns the number of successful deliveries.
    pub async fn broadcast(&self, channel: &str, envelope: &Envelope) -> usize {
        let targets: Vec<(ConnectionId, Weak<dyn Connection>)> = match self.channels.get(channel)
        {
            Some(subscribers) => subscribers
                .iter()
                .map(|(id, connection)| (id.clone(), Weak::clone(connection)))
                .collect(),
            None => return 0,
        };

        let text: Arc<str> = match codec::encode(envelope) {
            Ok(text) => Arc::from(text),
            Err(e) => {
                error!(channel = %channel, error = %e, "Failed to encode envelope");
                return 0;
            }
        };

        let sends = targets.into_iter().map(|(id, connection)| {
            let text = Arc::clone(&text);
            async move {
                let result = match connection.upgrade() {
                    Some(connection) => connection.send_raw(text).await,
                    None => Err(TransportError::ConnectionClosed),
                };
                (id, result)
            }
        });

        let mut delivered = 0;
        for (id, result) in join_all(sends).await {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    debug!(
                        channel = %channel,
                        connection = %id,
                        error = %e,
                        "Send failed, dropping subscriber"
                    );
                    self.leave(channel, &id);
                }
            }
        }

        trace!(
            channel = %channel,
            envelope = envelope.envelope_type().as_str(),
            recipients = delivered,
            "Broadcast"
        );
        delivered
    }

    /// Send an envelope to a single connection.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the send fails.
    pub async fn send_to(
        &self,
        connection: &dyn Connection,
        envelope: &Envelope,
    ) -> Result<(), TransportError> {
        trace!(
            connection = %connection.id(),
            envelope = envelope.envelope_type().as_str(),
            "Unicast"
        );
        connection.send(envelope).await
    }

    /// Channels with at least one subscriber, sorted.
    #[must_use]
    pub fn list_non_empty_channels(&self) -> Vec<ChannelId> {
        let mut channels: Vec<ChannelId> = self
            .channels
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        channels.sort();
        channels
    }

    /// Check if a channel exists.
    #[must_use]
    pub fn channel_exists(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    /// Get the subscriber count for a channel.
    #[must_use]
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .get(channel)
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }

    /// Check if a connection is subscribed to a channel.
    #[must_use]
    pub fn is_subscribed(&self, channel: &str, connection_id: &ConnectionId) -> bool {
        self.channels
            .get(channel)
            .map(|subscribers| subscribers.contains_key(connection_id))
            .unwrap_or(false)
    }

    /// Get registry statistics.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            channel_count: self.channels.len(),
            total_subscriptions: self.channels.iter().map(|e| e.value().len()).sum(),
        }
    }
}

/// Registry statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of channels with at least one subscriber.
    pub channel_count: usize,
    /// Total number of (channel, connection) subscriptions.
    pub total_subscriptions: usize,
}
