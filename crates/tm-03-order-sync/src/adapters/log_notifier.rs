use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::info;

use crate::domain::SyncError;
use crate::ports::ClientNotifier;

/// Notifier that only logs. Never fails.
#[derive(Debug, Default)]
pub struct LogNotifier {
    sent: AtomicU64,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ClientNotifier for LogNotifier {
    async fn notify(&self, uuid: &str) -> Result<(), SyncError> {
        self.sent.fetch_add(1, Ordering::Relaxed);
        info!(uuid, "Order paid, client notification logged");
        Ok(())
    }
}
