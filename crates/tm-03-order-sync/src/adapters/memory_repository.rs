//! In-memory order status store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{OrderStatus, OrderStatusRecord};
use tokio::time::Instant;
use tracing::debug;

use crate::domain::{PendingOrderFilter, SyncError};
use crate::ports::OrderStatusRepository;

#[derive(Clone, Debug)]
struct StoredOrder {
    status: OrderStatus,
    recorded_at: Instant,
}

/// Orders keyed by uuid. Queries return matches oldest first and evict
/// every order older than the filter's `max_age`.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<String, StoredOrder>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an order now. Re-inserting an uuid restarts its age.
    pub fn insert(&self, uuid: impl Into<String>, status: OrderStatus) {
        self.orders.write().insert(
            uuid.into(),
            StoredOrder {
                status,
                recorded_at: Instant::now(),
            },
        );
    }

    /// Returns `false` if the uuid is unknown.
    pub fn set_status(&self, uuid: &str, status: OrderStatus) -> bool {
        match self.orders.write().get_mut(uuid) {
            Some(order) => {
                order.status = status;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, uuid: &str) -> bool {
        self.orders.write().remove(uuid).is_some()
    }

    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }
}

#[async_trait]
impl OrderStatusRepository for InMemoryOrderRepository {
    async fn query_pending(
        &self,
        filter: &PendingOrderFilter,
    ) -> Result<Vec<OrderStatusRecord>, SyncError> {
        let mut orders = self.orders.write();
        let before = orders.len();
        orders.retain(|_, order| order.recorded_at.elapsed() <= filter.max_age);
        let evicted = before - orders.len();
        if evicted > 0 {
            debug!(evicted, remaining = orders.len(), "Evicted expired orders");
        }

        let mut records: Vec<OrderStatusRecord> = orders
            .iter()
            .map(|(uuid, order)| OrderStatusRecord {
                uuid: uuid.clone(),
                status: order.status,
                elapsed: order.recorded_at.elapsed(),
            })
            .filter(|record| filter.matches(record))
            .collect();
        drop(orders);

        records.sort_by(|a, b| b.elapsed.cmp(&a.elapsed).then_with(|| a.uuid.cmp(&b.uuid)));
        Ok(records)
    }
}
