//! # Subsystem Container
//!
//! Builds every subsystem from one `Arc<NodeConfig>`, the transport and the
//! external collaborators.
//!
//! ## Initialization Order
//!
//! ```text
//! 1. Shared state      TunnelRegistry, InMemoryOrderRepository
//! 2. tm-02 Processor   ProcessorConfig + ContentStore/PortAllocator/Launcher
//! 3. tm-01 Router      FulfillmentBridge(processor) + AnnouncementBuilder
//! 4. tm-03 Sync        repository + MeteredNotifier   (if sync.enabled)
//! ```

use std::sync::Arc;

use shared_bus::TransportHandles;
use tm_01_message_router::{AnnouncementBuilder, MessageRouter, PeerDirectory, RouterCounters};
use tm_02_order_processor::{ListenerReport, OrderFulfillment, OrderProcessor};
use tm_03_order_sync::{
    InMemoryOrderRepository, OrderStatusRepository, SyncCounters, SyncSupervisor,
};
use tokio::sync::mpsc;
use tracing::info;

use crate::adapters::{Collaborators, FulfillmentBridge, MeteredNotifier, TunnelRegistry};
use crate::container::config::NodeConfig;

/// Wired but not yet running subsystems.
pub struct SubsystemContainer {
    pub config: Arc<NodeConfig>,
    pub router: MessageRouter,
    /// `None` when `sync.enabled` is false.
    pub supervisor: Option<SyncSupervisor>,
    pub listener_reports: Option<mpsc::Receiver<ListenerReport>>,

    // Shared with the running tasks.
    pub tunnels: Arc<TunnelRegistry>,
    pub ledger: Arc<InMemoryOrderRepository>,
    pub peers: Arc<PeerDirectory>,
    pub router_counters: Arc<RouterCounters>,
    pub sync_counters: Option<Arc<SyncCounters>>,
}

impl SubsystemContainer {
    pub fn new(
        config: Arc<NodeConfig>,
        transport: TransportHandles,
        collaborators: Collaborators,
    ) -> Self {
        let Collaborators {
            content_store,
            port_allocator,
            launcher,
            listener_reports,
            geo_trace,
            notifier,
        } = collaborators;

        let tunnels = Arc::new(TunnelRegistry::new());
        let ledger = Arc::new(InMemoryOrderRepository::new());

        let processor: Arc<dyn OrderFulfillment> = Arc::new(OrderProcessor::new(
            config.processor_config(),
            content_store,
            port_allocator,
            launcher,
            Arc::clone(&transport.outbound),
        ));
        info!(
            "  [tm-02] Order processor ready (tunnel port {:?})",
            config.processor_config().tunnel_port()
        );

        let bridge = FulfillmentBridge::new(
            config.identity.role,
            processor,
            Arc::clone(&tunnels),
            Arc::clone(&ledger),
        );
        let announcer = AnnouncementBuilder::new(config.node_identity(), geo_trace);
        let router =
            MessageRouter::new(config.router_config(), transport, Arc::new(bridge), announcer);
        info!("  [tm-01] Message router ready (host {})", router.host_id());

        let supervisor = if config.sync.enabled {
            let repository: Arc<dyn OrderStatusRepository> = ledger.clone();
            let supervisor = SyncSupervisor::new(
                config.sync_config(),
                repository,
                Arc::new(MeteredNotifier::new(notifier)),
            );
            info!("  [tm-03] Order sync ready");
            Some(supervisor)
        } else {
            info!("  [tm-03] Order sync disabled");
            None
        };

        Self {
            peers: router.peers(),
            router_counters: router.counters(),
            sync_counters: supervisor.as_ref().map(SyncSupervisor::counters),
            config,
            router,
            supervisor,
            listener_reports,
            tunnels,
            ledger,
        }
    }
}
