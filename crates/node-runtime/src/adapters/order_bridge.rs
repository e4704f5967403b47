//! # Order Bridge
//!
//! Implements the router's `OrderHandler` port on top of the order
//! processor's `OrderFulfillment` API.
//!
//! | Node role | Order | Action |
//! |-----------|-------|--------|
//! | provider | unassigned | fulfill, track tunnel, record as awaiting payment |
//! | provider | assigned | ignore (already fulfilled by its provider) |
//! | client | assigned | log tunnel endpoint |
//! | client | unassigned | ignore |

use std::sync::Arc;

use async_trait::async_trait;
use market_telemetry::{
    log_order_event, metric_inc, time_histogram, ACTIVE_TUNNELS, COMPONENT_ERRORS, ORDERS_PROCESSED,
    ORDER_FULFILLMENT_DURATION,
};
use shared_types::{NodeRole, OrderStatus, TunnelOrder};
use tm_01_message_router::{HandlerError, OrderHandler};
use tm_02_order_processor::{ErrorClass, OrderFulfillment};
use tm_03_order_sync::InMemoryOrderRepository;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::adapters::tunnels::TunnelRegistry;

pub struct FulfillmentBridge {
    role: NodeRole,
    processor: Arc<dyn OrderFulfillment>,
    tunnels: Arc<TunnelRegistry>,
    ledger: Arc<InMemoryOrderRepository>,
}

impl FulfillmentBridge {
    pub fn new(
        role: NodeRole,
        processor: Arc<dyn OrderFulfillment>,
        tunnels: Arc<TunnelRegistry>,
        ledger: Arc<InMemoryOrderRepository>,
    ) -> Self {
        Self {
            role,
            processor,
            tunnels,
            ledger,
        }
    }

    async fn fulfill(
        &self,
        cancel: &CancellationToken,
        order: TunnelOrder,
    ) -> Result<(), HandlerError> {
        let _timer = time_histogram!(ORDER_FULFILLMENT_DURATION);
        let submitted = order.clone();

        match self.processor.fulfill(cancel, order).await {
            Ok(fulfilled) => {
                let uuid = fulfilled.order.uuid.clone();
                self.tunnels.insert(uuid.clone(), fulfilled.tunnel);
                self.ledger.insert(uuid.clone(), OrderStatus::AwaitingPayment);
                ACTIVE_TUNNELS.set(self.tunnels.len() as i64);
                metric_inc!(ORDERS_PROCESSED, &["fulfilled"]);
                info!(
                    "[tm-02] Order {} fulfilled on port {} for {}",
                    uuid,
                    fulfilled.order.port,
                    fulfilled.descriptor.name
                );
                Ok(())
            }
            Err(e) => {
                metric_inc!(ORDERS_PROCESSED, &[e.label()]);
                match e.class() {
                    ErrorClass::Validation => log_order_event!(
                        debug,
                        "order_processor",
                        "[tm-02] Order rejected",
                        submitted,
                        stage = %e.stage(),
                        error = %e
                    ),
                    class => {
                        metric_inc!(COMPONENT_ERRORS, &["order_processor", class.as_str()]);
                        log_order_event!(
                            warn,
                            "order_processor",
                            "[tm-02] Order failed",
                            submitted,
                            stage = %e.stage(),
                            error = %e
                        );
                    }
                }
                Err(HandlerError::new(e.label(), e.to_string()))
            }
        }
    }
}

#[async_trait]
impl OrderHandler for FulfillmentBridge {
    async fn handle_order(
        &self,
        cancel: &CancellationToken,
        order: TunnelOrder,
    ) -> Result<(), HandlerError> {
        match (self.role, order.is_assigned()) {
            (NodeRole::Provider, false) => self.fulfill(cancel, order).await,
            (NodeRole::Provider, true) => {
                debug!(uuid = %order.uuid, port = order.port, "Assigned order seen, ignoring");
                Ok(())
            }
            (NodeRole::Client, true) => {
                info!(
                    "[tm-02] Tunnel ready for order {} on port {} (provider {})",
                    order.uuid, order.port, order.wallet
                );
                Ok(())
            }
            (NodeRole::Client, false) => {
                debug!(uuid = %order.uuid, "Client node ignores unassigned order");
                Ok(())
            }
        }
    }
}
