//! # Service Layer
//!
//! [`SyncSupervisor`] drives one [`SyncWorker`] at a time.

pub mod supervisor;
pub mod worker;

pub use supervisor::{SyncSupervisor, WorkerSignal};
pub use worker::SyncWorker;
