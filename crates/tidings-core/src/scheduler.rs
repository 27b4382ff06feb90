//! Recurring refresh of subscribed channels.
//!
//! Once per interval the scheduler groups every non-empty channel by the
//! content request it resolves to, fetches each group once and fans the result
//! out:
//!
//! ```text
//! status:syncing -> data -> status:ready     (fresh content)
//! status:syncing -> status:ready             (empty listing, absent article/live)
//! status:syncing -> error -> status:error    (provider failure)
//! ```
//!
//! Groups are refreshed concurrently, so a slow or failing group never stops
//! or holds up the others. A failing cycle never stops the scheduler.

use crate::channel::{ChannelId, ContentRequest};
use crate::hub::Hub;
use crate::provider::FetchError;
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tidings_protocol::{Envelope, Status};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

/// Default time between refresh cycles.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Shortest accepted refresh interval.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Summary of one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Distinct content requests refreshed.
    pub groups: usize,
    /// Channels covered by those requests.
    pub channels: usize,
    /// Successful `data` deliveries.
    pub deliveries: usize,
    /// Groups whose fetch failed.
    pub failures: usize,
    /// Wall time of the cycle.
    pub duration: Duration,
}

/// The background refresh loop.
pub struct RefreshScheduler {
    hub: Arc<Hub>,
    interval: Duration,
}

impl RefreshScheduler {
    /// Create a scheduler. Intervals below one second are raised to one second.
    #[must_use]
    pub fn new(hub: Arc<Hub>, interval: Duration) -> Self {
        Self {
            hub,
            interval: interval.max(MIN_REFRESH_INTERVAL),
        }
    }

    /// The effective refresh interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the loop on the current runtime.
    pub fn spawn<F>(self, on_cycle: F) -> JoinHandle<()>
    where
        F: FnMut(&RefreshReport) + Send + 'static,
    {
        tokio::spawn(self.run(on_cycle))
    }

    /// Run the loop forever, calling `on_cycle` after every completed cycle.
    ///
    /// The first cycle starts immediately. Dropping the returned future (or
    /// aborting the task from [`spawn`](Self::spawn)) also aborts the cycle in
    /// flight.
    pub async fn run<F>(self, mut on_cycle: F)
    where
        F: FnMut(&RefreshReport) + Send + 'static,
    {
        info!(interval = ?self.interval, "Refresh scheduler started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            // Each cycle runs in its own task so a panic ends only that cycle
            let hub = Arc::clone(&self.hub);
            let mut cycle = JoinSet::new();
            cycle.spawn(async move { refresh_once(&hub).await });

            while let Some(outcome) = cycle.join_next().await {
                match outcome {
                    Ok(report) => {
                        if report.groups > 0 {
                            debug!(
                                groups = report.groups,
                                channels = report.channels,
                                deliveries = report.deliveries,
                                failures = report.failures,
                                elapsed = ?report.duration,
                                "Refresh cycle complete"
                            );
                        }
                        on_cycle(&report);
                    }
                    Err(e) => error!(error = %e, "Refresh cycle aborted"),
                }
            }
        }
    }
}

/// Run a single refresh cycle over every subscribed channel.
pub async fn refresh_once(hub: &Hub) -> RefreshReport {
    let started = Instant::now();

    let mut groups: BTreeMap<ContentRequest, Vec<ChannelId>> = BTreeMap::new();
    for channel in hub.registry().list_non_empty_channels() {
        match hub.resolver().resolve(&channel) {
            Some(request) => groups.entry(request).or_default().push(channel),
            None => trace!(channel = %channel, "Skipping unroutable channel"),
        }
    }

    let partials = join_all(
        groups
            .iter()
            .map(|(request, channels)| refresh_group(hub, request, channels)),
    )
    .await;

    let mut report = RefreshReport {
        groups: groups.len(),
        ..RefreshReport::default()
    };
    for partial in partials {
        report.channels += partial.channels;
        report.deliveries += partial.deliveries;
        report.failures += partial.failures;
    }

    report.duration = started.elapsed();
    report
}

/// Refresh one group. Envelopes for the group go out in order.
async fn refresh_group(
    hub: &Hub,
    request: &ContentRequest,
    channels: &[ChannelId],
) -> RefreshReport {
    let registry = hub.registry();
    let mut report = RefreshReport {
        channels: channels.len(),
        ..RefreshReport::default()
    };

    let syncing = Envelope::status(Status::Syncing, format!("Syncing {}", request));
    for channel in channels {
        registry.broadcast(channel, &syncing).await;
    }

    match hub.fetch(request).await {
        Ok(content) if !content.is_empty() => {
            let data = content.into_envelope();
            let ready = Envelope::status(Status::Ready, "Sync complete");
            for channel in channels {
                report.deliveries += registry.broadcast(channel, &data).await;
                registry.broadcast(channel, &ready).await;
            }
        }
        Ok(_) | Err(FetchError::NotFound(_)) => {
            debug!(request = %request, "No fresh content, keeping previous snapshot");
            let ready = Envelope::status(Status::Ready, "Sync complete");
            for channel in channels {
                registry.broadcast(channel, &ready).await;
            }
        }
        Err(e) => {
            warn!(
                request = %request,
                kind = request.kind(),
                error = %e,
                "Refresh failed"
            );
            report.failures += 1;

            let message = e.to_string();
            let failure = Envelope::error(message.clone());
            let status = Envelope::status(Status::Error, message);
            for channel in channels {
                registry.broadcast(channel, &failure).await;
                registry.broadcast(channel, &status).await;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TimeoutProvider;
    use crate::test_support::{headline, seen, Seen, StubProvider};
    use tidings_transport::memory::pair;

    #[tokio::test]
    async fn test_refresh_broadcasts_to_all_subscribers() {
        let provider =
            Arc::new(StubProvider::new().with_listing("POLITICS", vec![headline("Old")]));
        let hub = Hub::new(provider.clone());
        let (a, _ia, mut client_a) = pair("conn-a");
        let (b, _ib, mut client_b) = pair("conn-b");

        crate::session::handshake(&hub, "news:POLITICS:headline", &a)
            .await
            .unwrap();
        crate::session::handshake(&hub, "news:POLITICS:headline", &b)
            .await
            .unwrap();
        client_a.drain();
        client_b.drain();

        provider.set_listing("POLITICS", vec![headline("One"), headline("Two")]);
        let report = refresh_once(&hub).await;

        let expected = vec![
            Seen::Status(Status::Syncing),
            Seen::Data(2),
            Seen::Status(Status::Ready),
        ];
        let received_a = client_a.drain();
        let received_b = client_b.drain();
        assert_eq!(seen(&received_a), expected);
        assert_eq!(received_a, received_b);
        assert_eq!(report.groups, 1);
        assert_eq!(report.channels, 1);
        assert_eq!(report.deliveries, 2);
        assert_eq!(report.failures, 0);
    }

    #[tokio::test]
    async fn test_refresh_skips_data_on_empty_listing() {
        let hub = Hub::new(Arc::new(StubProvider::new()));
        let (a, _ia, mut client_a) = pair("conn-a");
        hub.registry().join("news:HOME:headline", &a);

        refresh_once(&hub).await;

        assert_eq!(
            seen(&client_a.drain()),
            vec![Seen::Status(Status::Syncing), Seen::Status(Status::Ready)]
        );
    }

    #[tokio::test]
    async fn test_refresh_absent_live_feed_is_ready() {
        let hub = Hub::new(Arc::new(StubProvider::new()));
        let (a, _ia, mut client_a) = pair("conn-a");
        hub.registry().join("news:liveTV", &a);

        let report = refresh_once(&hub).await;

        assert_eq!(report.failures, 0);
        assert_eq!(
            seen(&client_a.drain()),
            vec![Seen::Status(Status::Syncing), Seen::Status(Status::Ready)]
        );
    }

    #[tokio::test]
    async fn test_refresh_failure_is_isolated() {
        let provider = StubProvider::new()
            .failing_listing("BUSINESS", "upstream 503")
            .with_listing("SPORTS", vec![headline("Goal")]);
        let hub = Hub::new(Arc::new(provider));
        let (a, _ia, mut client_a) = pair("conn-a");
        let (b, _ib, mut client_b) = pair("conn-b");
        hub.registry().join("news:BUSINESS:headline", &a);
        hub.registry().join("news:SPORTS:headline", &b);

        let report = refresh_once(&hub).await;

        assert_eq!(report.groups, 2);
        assert_eq!(report.failures, 1);
        assert_eq!(
            seen(&client_a.drain()),
            vec![
                Seen::Status(Status::Syncing),
                Seen::Error("Fetch failed: upstream 503".into()),
                Seen::Status(Status::Error),
            ]
        );
        assert_eq!(
            seen(&client_b.drain()),
            vec![
                Seen::Status(Status::Syncing),
                Seen::Data(1),
                Seen::Status(Status::Ready),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_slow_group_does_not_delay_others() {
        let provider = StubProvider::new()
            .with_listing("BUSINESS", vec![headline("Markets")])
            .with_slow_listing("BUSINESS", Duration::from_secs(3600))
            .with_listing("SPORTS", vec![headline("Goal")]);
        let timeout = Duration::from_secs(90);
        let hub = Arc::new(Hub::new(Arc::new(TimeoutProvider::new(provider, timeout))));
        let (a, _ia, mut client_a) = pair("conn-a");
        let (b, _ib, mut client_b) = pair("conn-b");
        hub.registry().join("news:BUSINESS:headline", &a);
        hub.registry().join("news:SPORTS:headline", &b);

        let started = tokio::time::Instant::now();
        let cycle = tokio::spawn({
            let hub = Arc::clone(&hub);
            async move { refresh_once(&hub).await }
        });

        let mut received_b = Vec::new();
        for _ in 0..3 {
            received_b.push(client_b.next_envelope().await.unwrap());
        }
        assert!(started.elapsed() < timeout);
        assert_eq!(
            seen(&received_b),
            vec![
                Seen::Status(Status::Syncing),
                Seen::Data(1),
                Seen::Status(Status::Ready),
            ]
        );

        let report = cycle.await.unwrap();
        assert_eq!(report.groups, 2);
        assert_eq!(report.channels, 2);
        assert_eq!(report.failures, 1);
        assert_eq!(report.deliveries, 1);

        let received_a = seen(&client_a.drain());
        assert_eq!(received_a.len(), 3);
        assert_eq!(received_a[0], Seen::Status(Status::Syncing));
        assert!(matches!(received_a[1], Seen::Error(_)));
        assert_eq!(received_a[2], Seen::Status(Status::Error));
    }

    #[tokio::test]
    async fn test_refresh_fetches_shared_request_once() {
        let provider = Arc::new(
            StubProvider::new().with_detail("https://3news.com/news/story", "Story"),
        );
        let hub = Hub::new(provider.clone());
        let (a, _ia, mut client_a) = pair("conn-a");
        let (b, _ib, mut client_b) = pair("conn-b");
        hub.registry().join("news:HOME:topic_detail:news/story", &a);
        hub.registry()
            .join("news:POLITICS:topic_detail:https://3news.com/news/story", &b);
        hub.registry().join("news:bogus", &b);

        let report = refresh_once(&hub).await;

        assert_eq!(provider.calls(), 1);
        assert_eq!(report.groups, 1);
        assert_eq!(report.channels, 2);
        assert_eq!(seen(&client_a.drain())[1], Seen::Object);
        assert_eq!(seen(&client_b.drain())[1], Seen::Object);
    }

    #[tokio::test]
    async fn test_refresh_with_no_subscribers() {
        let provider = Arc::new(StubProvider::new());
        let hub = Hub::new(provider.clone());

        let report = refresh_once(&hub).await;

        assert_eq!(report.groups, 0);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_runs_every_interval() {
        let provider = Arc::new(StubProvider::new().with_listing("HOME", vec![headline("X")]));
        let hub = Arc::new(Hub::new(provider.clone()));
        let (a, _ia, mut client_a) = pair("conn-a");
        hub.registry().join("news:HOME:headline", &a);

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = RefreshScheduler::new(Arc::clone(&hub), Duration::from_secs(300))
            .spawn(move |report| {
                let _ = tx.send(report.clone());
            });

        let first = rx.recv().await.unwrap();
        assert_eq!(first.deliveries, 1);

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(rx.try_recv().is_err());

        let second = rx.recv().await.unwrap();
        assert_eq!(second.groups, 1);
        assert_eq!(provider.calls(), 2);
        assert_eq!(client_a.drain().len(), 6);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_abort_cancels_cycle_in_flight() {
        let provider = StubProvider::new()
            .with_listing("HOME", vec![headline("X")])
            .with_delay(Duration::from_secs(60));
        let provider = Arc::new(provider);
        let hub = Arc::new(Hub::new(provider.clone()));
        let (a, _ia, mut client_a) = pair("conn-a");
        hub.registry().join("news:HOME:headline", &a);

        let handle =
            RefreshScheduler::new(Arc::clone(&hub), Duration::from_secs(300)).spawn(|_| {});

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(provider.calls(), 1);

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(seen(&client_a.drain()), vec![Seen::Status(Status::Syncing)]);
    }

    #[test]
    fn test_scheduler_interval_floor() {
        let hub = Arc::new(Hub::new(Arc::new(StubProvider::new())));
        let scheduler = RefreshScheduler::new(hub, Duration::ZERO);
        assert_eq!(scheduler.interval(), MIN_REFRESH_INTERVAL);
    }
}
