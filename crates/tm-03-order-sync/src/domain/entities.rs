//! # Synchronizer Entities

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use shared_types::{OrderStatus, OrderStatusRecord};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_NOTIFY_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// Which persisted orders a poll asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingOrderFilter {
    pub status: OrderStatus,
    /// Orders recorded longer ago than this are ignored.
    pub max_age: Duration,
}

impl PendingOrderFilter {
    pub fn awaiting_payment(max_age: Duration) -> Self {
        Self {
            status: OrderStatus::AwaitingPayment,
            max_age,
        }
    }

    pub fn matches(&self, record: &OrderStatusRecord) -> bool {
        record.status == self.status && record.elapsed <= self.max_age
    }
}

/// Restart delay policy.
///
/// Delays start at `initial` and double per consecutive failure up to
/// `max`. A worker that ran at least `reset_after` before failing resets
/// the sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub reset_after: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
            reset_after: Duration::from_secs(5 * 60),
        }
    }
}

/// Backoff state owned by the supervisor.
#[derive(Clone, Debug)]
pub struct Backoff {
    policy: BackoffPolicy,
    current: Duration,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            current: policy.initial,
        }
    }

    /// Delay before the next restart, given how long the failed worker ran.
    pub fn next_delay(&mut self, ran_for: Duration) -> Duration {
        if ran_for >= self.policy.reset_after {
            self.current = self.policy.initial;
        }
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.policy.max);
        delay
    }
}

/// Synchronizer settings.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub poll_interval: Duration,
    pub notify_delay: Duration,
    pub max_age: Duration,
    pub backoff: BackoffPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            notify_delay: DEFAULT_NOTIFY_DELAY,
            max_age: DEFAULT_MAX_AGE,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl SyncConfig {
    pub fn filter(&self) -> PendingOrderFilter {
        PendingOrderFilter::awaiting_payment(self.max_age)
    }
}

/// Why a worker ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerExit {
    /// Stopped through its cancellation token.
    Cancelled,
    /// Unrecoverable worker failure caught at the worker boundary.
    Panicked { message: String },
}

/// Point-in-time supervisor statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    pub workers_spawned: u64,
    pub restarts: u64,
    pub panics: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
    pub query_failures: u64,
}

/// Live counters behind [`SupervisorStats`], shared by supervisor and workers.
#[derive(Debug, Default)]
pub struct SyncCounters {
    pub(crate) workers_spawned: AtomicU64,
    pub(crate) restarts: AtomicU64,
    pub(crate) panics: AtomicU64,
    pub(crate) notifications_sent: AtomicU64,
    pub(crate) notifications_failed: AtomicU64,
    pub(crate) query_failures: AtomicU64,
}

impl SyncCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SupervisorStats {
        SupervisorStats {
            workers_spawned: self.workers_spawned.load(Ordering::Relaxed),
            restarts: self.restarts.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            notifications_failed: self.notifications_failed.load(Ordering::Relaxed),
            query_failures: self.query_failures.load(Ordering::Relaxed),
        }
    }
}
