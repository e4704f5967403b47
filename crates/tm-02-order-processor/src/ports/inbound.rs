//! # Driving Port (Inbound API)

use async_trait::async_trait;
use shared_types::TunnelOrder;
use tokio_util::sync::CancellationToken;

use crate::domain::{FulfilledOrder, OrderError};

/// Order fulfillment as seen by the host.
#[async_trait]
pub trait OrderFulfillment: Send + Sync {
    /// Run the full pipeline for one order.
    ///
    /// Exactly one attempt; any error is terminal for this order.
    async fn fulfill(
        &self,
        cancel: &CancellationToken,
        order: TunnelOrder,
    ) -> Result<FulfilledOrder, OrderError>;
}
