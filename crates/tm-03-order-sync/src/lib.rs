//! # TM-03 Order-Status Synchronizer
//!
//! Tells clients when their orders have been paid.
//!
//! ## Supervision
//!
//! ```text
//! ┌──────────────────┐  spawn   ┌─────────────────────────────────┐
//! │  SyncSupervisor  │─────────▶│ SyncWorker (catch_unwind)       │
//! │  backoff 1s..60s │◀─────────│  every 30s: query_pending       │
//! └──────────────────┘  signal  │  per record: sleep 5s, notify   │
//!                               └─────────────────────────────────┘
//! ```
//!
//! | Event | Worker | Supervisor |
//! |-------|--------|------------|
//! | Query error | log, skip tick | - |
//! | Notify error | log, continue | - |
//! | Panic | log message and backtrace, send `Panicked` | backoff, respawn |
//! | Cancel | send `Cancelled` | return stats |
//!
//! Exactly one worker is live at any time. The synchronizer never writes
//! to the repository.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{HttpClientNotifier, InMemoryOrderRepository, LogNotifier, DEFAULT_NOTIFY_TIMEOUT};
pub use domain::{
    Backoff, BackoffPolicy, PendingOrderFilter, SupervisorStats, SyncConfig, SyncCounters,
    SyncError, WorkerExit, DEFAULT_MAX_AGE, DEFAULT_NOTIFY_DELAY, DEFAULT_POLL_INTERVAL,
};
pub use ports::{ClientNotifier, OrderStatusRepository};
pub use service::{SyncSupervisor, SyncWorker, WorkerSignal};
