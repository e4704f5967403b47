//! # Driven Ports (Outbound SPI)

use async_trait::async_trait;
use shared_types::OrderStatusRecord;

use crate::domain::{PendingOrderFilter, SyncError};

/// Read access to locally persisted orders.
///
/// The synchronizer never writes through this port.
#[async_trait]
pub trait OrderStatusRepository: Send + Sync {
    async fn query_pending(
        &self,
        filter: &PendingOrderFilter,
    ) -> Result<Vec<OrderStatusRecord>, SyncError>;
}

/// Tells the counterpart client that its order was paid.
#[async_trait]
pub trait ClientNotifier: Send + Sync {
    async fn notify(&self, uuid: &str) -> Result<(), SyncError>;
}
