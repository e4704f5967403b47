//! # Sync Worker
//!
//! Polls the repository every `poll_interval` and notifies the client of
//! each pending order, pausing `notify_delay` before every notification.
//! Recoverable errors are logged and never end the loop. A panic anywhere
//! in the loop is caught here and turned into [`WorkerExit::Panicked`].

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::{SyncConfig, SyncCounters, WorkerExit};
use crate::ports::{ClientNotifier, OrderStatusRepository};

pub struct SyncWorker {
    id: u64,
    config: SyncConfig,
    repository: Arc<dyn OrderStatusRepository>,
    notifier: Arc<dyn ClientNotifier>,
    counters: Arc<SyncCounters>,
}

impl SyncWorker {
    pub fn new(
        id: u64,
        config: SyncConfig,
        repository: Arc<dyn OrderStatusRepository>,
        notifier: Arc<dyn ClientNotifier>,
        counters: Arc<SyncCounters>,
    ) -> Self {
        Self {
            id,
            config,
            repository,
            notifier,
            counters,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Run until cancelled or until the loop panics.
    pub async fn run(self, cancel: CancellationToken) -> WorkerExit {
        info!(worker = self.id, "Sync worker started");

        match AssertUnwindSafe(self.poll_loop(&cancel)).catch_unwind().await {
            Ok(()) => {
                info!(worker = self.id, "Sync worker stopped");
                WorkerExit::Cancelled
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                let backtrace = Backtrace::force_capture();
                error!(
                    worker = self.id,
                    panic = %message,
                    %backtrace,
                    "Sync worker panicked"
                );
                SyncCounters::bump(&self.counters.panics);
                WorkerExit::Panicked { message }
            }
        }
    }

    async fn poll_loop(&self, cancel: &CancellationToken) {
        let period = self.config.poll_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            if let Some(notified) = self.tick(cancel).await {
                if notified > 0 {
                    debug!(worker = self.id, notified, "Sync tick complete");
                }
            } else {
                return;
            }
        }
    }

    /// One poll cycle. Returns `None` if cancelled part way through.
    async fn tick(&self, cancel: &CancellationToken) -> Option<usize> {
        let filter = self.config.filter();
        let records = match self.repository.query_pending(&filter).await {
            Ok(records) => records,
            Err(e) => {
                SyncCounters::bump(&self.counters.query_failures);
                warn!(worker = self.id, error = %e, "Pending order query failed, skipping tick");
                return Some(0);
            }
        };

        let mut notified = 0;
        for record in records {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                _ = sleep(self.config.notify_delay) => {}
            }

            match self.notifier.notify(&record.uuid).await {
                Ok(()) => {
                    notified += 1;
                    SyncCounters::bump(&self.counters.notifications_sent);
                    info!(worker = self.id, uuid = %record.uuid, "Client notified");
                }
                Err(e) => {
                    SyncCounters::bump(&self.counters.notifications_failed);
                    warn!(worker = self.id, uuid = %record.uuid, error = %e, "Client notification failed");
                }
            }
        }
        Some(notified)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
