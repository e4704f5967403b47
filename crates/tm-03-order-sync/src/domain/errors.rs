//! # Domain Errors
//!
//! Recoverable failures only. A panic inside the worker is not represented
//! here; it is caught at the worker boundary and becomes
//! `WorkerExit::Panicked`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Persistence query failed; the tick is skipped.
    #[error("Order repository query failed: {0}")]
    Repository(String),

    /// Client notification failed; the next tick is unaffected.
    #[error("Notifying client of order {uuid} failed: {reason}")]
    Notify { uuid: String, reason: String },
}
