//! Copies subsystem statistics into Prometheus gauges.
//!
//! The subsystems keep their own atomic counters and know nothing about
//! Prometheus. This task samples them on a fixed period.

use std::sync::Arc;
use std::time::Duration;

use market_telemetry::{GEO_TRACE_FAILURES, PEERS_KNOWN, ROUTER_EVENTS, SYNC_WORKER_RESTARTS};
use tm_01_message_router::{PeerDirectory, RouterCounters, RouterStats};
use tm_03_order_sync::SyncCounters;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct MetricsSampler {
    router: Arc<RouterCounters>,
    peers: Arc<PeerDirectory>,
    sync: Option<Arc<SyncCounters>>,
    period: Duration,
    geo_failures_seen: u64,
}

impl MetricsSampler {
    pub fn new(
        router: Arc<RouterCounters>,
        peers: Arc<PeerDirectory>,
        sync: Option<Arc<SyncCounters>>,
        period: Duration,
    ) -> Self {
        Self {
            router,
            peers,
            sync,
            period,
            geo_failures_seen: 0,
        }
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.sample(),
            }
        }
        // Final sample so the shutdown summary sees the last values.
        self.sample();
    }

    pub fn sample(&mut self) {
        let stats = self.router.snapshot();
        for (category, value) in router_categories(&stats) {
            ROUTER_EVENTS.with_label_values(&[category]).set(value as i64);
        }

        // Counter, so only the delta since the last sample is added.
        if stats.geo_trace_failures > self.geo_failures_seen {
            GEO_TRACE_FAILURES.inc_by(stats.geo_trace_failures - self.geo_failures_seen);
            self.geo_failures_seen = stats.geo_trace_failures;
        }

        PEERS_KNOWN.set(self.peers.len() as i64);

        if let Some(sync) = &self.sync {
            SYNC_WORKER_RESTARTS.set(sync.snapshot().restarts as i64);
        }

        debug!(received = stats.received, peers = self.peers.len(), "Metrics sampled");
    }
}

fn router_categories(stats: &RouterStats) -> [(&'static str, u64); 7] {
    [
        ("received", stats.received),
        ("dropped", stats.dropped),
        ("orders_dispatched", stats.orders_dispatched),
        ("peer_updates", stats.peer_updates),
        ("announcements", stats.announcements),
        ("announce_failures", stats.announce_failures),
        ("transport_logs", stats.transport_logs),
    ]
}
