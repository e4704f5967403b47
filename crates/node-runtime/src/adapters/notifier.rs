//! Client notifier decorator that records Prometheus counters.

use std::sync::Arc;

use async_trait::async_trait;
use market_telemetry::{metric_inc, COMPONENT_ERRORS, SYNC_NOTIFICATIONS};
use tm_03_order_sync::{ClientNotifier, SyncError};

pub struct MeteredNotifier {
    inner: Arc<dyn ClientNotifier>,
}

impl MeteredNotifier {
    pub fn new(inner: Arc<dyn ClientNotifier>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ClientNotifier for MeteredNotifier {
    async fn notify(&self, uuid: &str) -> Result<(), SyncError> {
        let result = self.inner.notify(uuid).await;
        match &result {
            Ok(()) => metric_inc!(SYNC_NOTIFICATIONS, &["sent"]),
            Err(_) => {
                metric_inc!(SYNC_NOTIFICATIONS, &["failed"]);
                metric_inc!(COMPONENT_ERRORS, &["order_sync", "notify"]);
            }
        }
        result
    }
}
