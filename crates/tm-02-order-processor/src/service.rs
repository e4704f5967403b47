//! # Order Processor Service
//!
//! Implements [`OrderFulfillment`] on top of the driven ports.
//!
//! ```text
//! Received ─wallet match─→ Authorized ─fetch (10s)─→ DescriptorFetched
//!     ─probe base+1─→ PortAssigned ─launch + republish─→ Published
//! ```
//!
//! Every arrow can fail; a failure ends processing of that order. There is
//! no retry and no alternate-port search.

use std::sync::Arc;

use async_trait::async_trait;
use shared_bus::MessagePublisher;
use shared_types::{Envelope, ServiceDescriptor, TunnelOrder};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{
    FulfilledOrder, FulfillmentStage, OrderError, ProcessorConfig, TunnelSpec,
};
use crate::ports::{ContentStore, OrderFulfillment, PortAllocator, TunnelLauncher};

/// Provider-side order pipeline.
pub struct OrderProcessor {
    config: ProcessorConfig,
    store: Arc<dyn ContentStore>,
    ports: Arc<dyn PortAllocator>,
    launcher: Arc<dyn TunnelLauncher>,
    outbound: Arc<dyn MessagePublisher>,
}

impl OrderProcessor {
    pub fn new(
        config: ProcessorConfig,
        store: Arc<dyn ContentStore>,
        ports: Arc<dyn PortAllocator>,
        launcher: Arc<dyn TunnelLauncher>,
        outbound: Arc<dyn MessagePublisher>,
    ) -> Self {
        Self {
            config,
            store,
            ports,
            launcher,
            outbound,
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    fn authorize(&self, order: &TunnelOrder) -> Result<(), OrderError> {
        if order.wallet != self.config.wallet {
            return Err(OrderError::Unauthorized {
                uuid: order.uuid.clone(),
                requested: order.wallet.clone(),
            });
        }
        Ok(())
    }

    async fn fetch_descriptor(
        &self,
        cancel: &CancellationToken,
        cid: &str,
    ) -> Result<ServiceDescriptor, OrderError> {
        let timeout = self.config.fetch_timeout;
        let fetch = tokio::time::timeout(timeout, self.store.fetch(cid));

        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(OrderError::Cancelled { stage: FulfillmentStage::Authorized });
            }
            result = fetch => match result {
                Err(_) => {
                    return Err(OrderError::FetchTimeout { cid: cid.to_string(), timeout });
                }
                Ok(Err(source)) => {
                    return Err(OrderError::Fetch { cid: cid.to_string(), source });
                }
                Ok(Ok(bytes)) => bytes,
            },
        };

        ServiceDescriptor::from_bytes(&bytes).map_err(|e| OrderError::InvalidDescriptor {
            cid: cid.to_string(),
            reason: e.to_string(),
        })
    }

    async fn assign_port(&self) -> Result<u16, OrderError> {
        let port = self
            .config
            .tunnel_port()
            .ok_or(OrderError::PortOverflow {
                base_port: self.config.base_port,
            })?;

        self.ports
            .probe(port)
            .await
            .map_err(|source| OrderError::PortUnavailable { port, source })?;
        Ok(port)
    }

    async fn publish(&self, order: &TunnelOrder) -> Result<(), OrderError> {
        let publish_error = |reason: String| OrderError::Publish {
            uuid: order.uuid.clone(),
            reason,
        };

        let payload = Envelope::order(order)
            .and_then(|envelope| envelope.to_json())
            .map_err(|e| publish_error(e.to_string()))?;

        self.outbound
            .publish(payload)
            .await
            .map_err(|e| publish_error(e.to_string()))
    }
}

#[async_trait]
impl OrderFulfillment for OrderProcessor {
    async fn fulfill(
        &self,
        cancel: &CancellationToken,
        order: TunnelOrder,
    ) -> Result<FulfilledOrder, OrderError> {
        debug!(uuid = %order.uuid, wallet = %order.wallet, "Order received");

        self.authorize(&order)?;

        let descriptor = self.fetch_descriptor(cancel, &order.server_cid).await?;
        debug!(
            uuid = %order.uuid,
            service = %descriptor.name,
            target = %descriptor.target_addr(),
            "Descriptor fetched"
        );

        let port = self.assign_port().await?;
        if cancel.is_cancelled() {
            return Err(OrderError::Cancelled {
                stage: FulfillmentStage::PortAssigned,
            });
        }

        let spec = TunnelSpec {
            order_uuid: order.uuid.clone(),
            port,
            descriptor: descriptor.clone(),
        };
        let tunnel = self
            .launcher
            .launch(spec, cancel.child_token())
            .await
            .map_err(|source| OrderError::ListenerStartup { port, source })?;

        let fulfilled = order.with_port(port);
        if let Err(e) = self.publish(&fulfilled).await {
            warn!(uuid = %order.uuid, port, "Republish failed, stopping tunnel listener");
            tunnel.stop();
            return Err(e);
        }

        info!(
            uuid = %fulfilled.uuid,
            port,
            target = %descriptor.target_addr(),
            "Order fulfilled"
        );

        Ok(FulfilledOrder {
            order: fulfilled,
            descriptor,
            tunnel,
        })
    }
}
