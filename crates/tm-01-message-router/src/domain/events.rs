//! Router events and statistics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use shared_bus::InboundMessage;

/// Announcement period.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Peers silent for longer than this are dropped from the directory.
pub const DEFAULT_PEER_TTL: Duration = Duration::from_secs(60);

/// The closed set of things the router reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouterEvent {
    /// A message from another peer on the topic.
    Inbound(InboundMessage),
    /// Announcement timer fired.
    Heartbeat,
    /// Diagnostic line from the transport.
    TransportLog(String),
}

/// Router settings.
#[derive(Clone, Debug)]
pub struct RouterConfig {
    pub heartbeat_interval: Duration,
    pub peer_ttl: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            peer_ttl: DEFAULT_PEER_TTL,
        }
    }
}

/// Outcome of routing one inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Order handed to the order handler.
    Order { uuid: String },
    /// Announcement stored in the peer directory.
    Peer { peer_id: String, new: bool },
    /// Our own announcement echoed back.
    OwnAnnouncement,
}

/// Point-in-time router statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub received: u64,
    pub dropped: u64,
    pub orders_dispatched: u64,
    pub peer_updates: u64,
    pub announcements: u64,
    pub announce_failures: u64,
    pub geo_trace_failures: u64,
    pub transport_logs: u64,
}

/// Live counters behind [`RouterStats`]. Shared with whoever wants to sample
/// them while the router runs.
#[derive(Debug, Default)]
pub struct RouterCounters {
    pub(crate) received: AtomicU64,
    pub(crate) dropped: AtomicU64,
    pub(crate) orders_dispatched: AtomicU64,
    pub(crate) peer_updates: AtomicU64,
    pub(crate) announcements: AtomicU64,
    pub(crate) announce_failures: AtomicU64,
    pub(crate) geo_trace_failures: AtomicU64,
    pub(crate) transport_logs: AtomicU64,
}

impl RouterCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RouterStats {
        RouterStats {
            received: self.received.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            orders_dispatched: self.orders_dispatched.load(Ordering::Relaxed),
            peer_updates: self.peer_updates.load(Ordering::Relaxed),
            announcements: self.announcements.load(Ordering::Relaxed),
            announce_failures: self.announce_failures.load(Ordering::Relaxed),
            geo_trace_failures: self.geo_trace_failures.load(Ordering::Relaxed),
            transport_logs: self.transport_logs.load(Ordering::Relaxed),
        }
    }
}
