//! # Adapters
//!
//! - [`InMemoryOrderRepository`]: thread-safe store applying the filter
//! - [`HttpClientNotifier`]: JSON POST to a client callback URL
//! - [`LogNotifier`]: logs only; used when no callback is configured

pub mod http_notifier;
pub mod log_notifier;
pub mod memory_repository;

pub use http_notifier::{HttpClientNotifier, DEFAULT_NOTIFY_TIMEOUT};
pub use log_notifier::LogNotifier;
pub use memory_repository::InMemoryOrderRepository;
