//! # Sync Supervisor
//!
//! Keeps exactly one [`SyncWorker`] alive.
//!
//! ```text
//! run ─spawn─▶ worker #1 ──panic──▶ signal ─┐
//!              ▲                             │ backoff (1s, 2s, 4s … 60s)
//!              └─────────── spawn #2 ◀───────┘
//! ```
//!
//! A replacement is spawned only after the previous worker's exit signal
//! has been received, so two workers never overlap.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::{Backoff, SupervisorStats, SyncConfig, SyncCounters, WorkerExit};
use crate::ports::{ClientNotifier, OrderStatusRepository};
use crate::service::worker::SyncWorker;

/// Exit report a worker task sends to its supervisor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerSignal {
    pub worker_id: u64,
    pub exit: WorkerExit,
    pub ran_for: Duration,
}

pub struct SyncSupervisor {
    config: SyncConfig,
    repository: Arc<dyn OrderStatusRepository>,
    notifier: Arc<dyn ClientNotifier>,
    counters: Arc<SyncCounters>,
    signal_tx: mpsc::Sender<WorkerSignal>,
    signal_rx: mpsc::Receiver<WorkerSignal>,
    next_worker_id: u64,
}

impl SyncSupervisor {
    pub fn new(
        config: SyncConfig,
        repository: Arc<dyn OrderStatusRepository>,
        notifier: Arc<dyn ClientNotifier>,
    ) -> Self {
        // One worker at a time, so one slot is enough.
        let (signal_tx, signal_rx) = mpsc::channel(1);
        Self {
            config,
            repository,
            notifier,
            counters: Arc::new(SyncCounters::default()),
            signal_tx,
            signal_rx,
            next_worker_id: 1,
        }
    }

    /// Live counters, readable while the supervisor runs.
    pub fn counters(&self) -> Arc<SyncCounters> {
        Arc::clone(&self.counters)
    }

    pub fn stats(&self) -> SupervisorStats {
        self.counters.snapshot()
    }

    /// Supervise workers until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) -> SupervisorStats {
        info!(
            poll_secs = self.config.poll_interval.as_secs(),
            max_age_secs = self.config.max_age.as_secs(),
            "Order sync supervisor started"
        );

        let mut backoff = Backoff::new(self.config.backoff);
        let mut current = self.spawn_worker(&cancel);

        loop {
            let signal = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                signal = self.signal_rx.recv() => signal,
            };

            let Some(signal) = signal else {
                error!("Worker signal channel closed");
                break;
            };

            match signal.exit {
                WorkerExit::Cancelled => {
                    debug!(worker = signal.worker_id, "Worker reported cancellation");
                    break;
                }
                WorkerExit::Panicked { message } => {
                    let delay = backoff.next_delay(signal.ran_for);
                    warn!(
                        worker = signal.worker_id,
                        ran_secs = signal.ran_for.as_secs(),
                        panic = %message,
                        restart_in_ms = delay.as_millis() as u64,
                        "Sync worker failed, scheduling restart"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = sleep(delay) => {}
                    }

                    SyncCounters::bump(&self.counters.restarts);
                    current = self.spawn_worker(&cancel);
                }
            }
        }

        if let Err(e) = current.await {
            error!(error = %e, "Sync worker task did not finish cleanly");
        }

        let stats = self.stats();
        info!(
            workers = stats.workers_spawned,
            restarts = stats.restarts,
            notified = stats.notifications_sent,
            "Order sync supervisor stopped"
        );
        stats
    }

    fn spawn_worker(&mut self, cancel: &CancellationToken) -> JoinHandle<()> {
        let worker_id = self.next_worker_id;
        self.next_worker_id += 1;
        SyncCounters::bump(&self.counters.workers_spawned);

        let worker = SyncWorker::new(
            worker_id,
            self.config.clone(),
            Arc::clone(&self.repository),
            Arc::clone(&self.notifier),
            Arc::clone(&self.counters),
        );
        let signal_tx = self.signal_tx.clone();
        let token = cancel.child_token();

        tokio::spawn(async move {
            let started = Instant::now();
            let exit = worker.run(token).await;
            let signal = WorkerSignal {
                worker_id,
                exit,
                ran_for: started.elapsed(),
            };
            if signal_tx.send(signal).await.is_err() {
                debug!(worker = worker_id, "Supervisor gone before worker exit was reported");
            }
        })
    }
}
