//! # Driven Ports (Outbound SPI)

use async_trait::async_trait;
use shared_types::{GeoTrace, TunnelOrder};
use tokio_util::sync::CancellationToken;

use crate::domain::{GeoTraceError, HandlerError};

/// Receives every decoded `order` envelope.
///
/// The router awaits the handler before taking the next event, so a slow
/// handler delays everything behind it.
#[async_trait]
pub trait OrderHandler: Send + Sync {
    async fn handle_order(
        &self,
        cancel: &CancellationToken,
        order: TunnelOrder,
    ) -> Result<(), HandlerError>;
}

/// Best-effort location lookup for announcements.
#[async_trait]
pub trait GeoTraceSource: Send + Sync {
    async fn trace(&self) -> Result<GeoTrace, GeoTraceError>;
}
