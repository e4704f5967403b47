//! # Node Runtime
//!
//! Owns the root `CancellationToken` and the long-running tasks.
//!
//! ## Tasks
//!
//! | Task | Ends when |
//! |------|-----------|
//! | `[tm-01]` message router | cancelled, or inbound feed closed |
//! | `[tm-03]` sync supervisor | cancelled |
//! | listener monitor | cancelled, or every launcher dropped |
//! | metrics sampler | cancelled |
//!
//! Every task gets a child of the root token, so `shutdown()` stops them
//! all. Tunnel listeners hang off the router's token through the order
//! processor and are stopped by the same cancellation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use shared_bus::TransportHandles;
use tm_01_message_router::{PeerDirectory, RouterCounters, RouterStats};
use tm_03_order_sync::{InMemoryOrderRepository, SupervisorStats, SyncCounters};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::adapters::{Collaborators, ListenerMonitor, MetricsSampler, TunnelRegistry};
use crate::container::{NodeConfig, SubsystemContainer};

/// How long each task gets to finish after cancellation.
const TASK_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Statistics reported by `shutdown()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RuntimeSummary {
    pub router: RouterStats,
    pub sync: Option<SupervisorStats>,
    pub tunnels_stopped: usize,
    pub uptime_secs: i64,
}

pub struct NodeRuntime {
    config: Arc<NodeConfig>,
    container: Option<SubsystemContainer>,
    cancel: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    started_at: Option<DateTime<Utc>>,

    peers: Arc<PeerDirectory>,
    router_counters: Arc<RouterCounters>,
    sync_counters: Option<Arc<SyncCounters>>,
    tunnels: Arc<TunnelRegistry>,
    ledger: Arc<InMemoryOrderRepository>,
}

impl NodeRuntime {
    pub fn new(
        config: Arc<NodeConfig>,
        transport: TransportHandles,
        collaborators: Collaborators,
    ) -> Self {
        info!("Creating tunnel-market node runtime");
        let container = SubsystemContainer::new(Arc::clone(&config), transport, collaborators);

        Self {
            peers: Arc::clone(&container.peers),
            router_counters: Arc::clone(&container.router_counters),
            sync_counters: container.sync_counters.clone(),
            tunnels: Arc::clone(&container.tunnels),
            ledger: Arc::clone(&container.ledger),
            config,
            container: Some(container),
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
            started_at: None,
        }
    }

    /// Spawn every subsystem task. Must be called once, inside a tokio
    /// runtime.
    pub fn start(&mut self) -> Result<()> {
        let Some(container) = self.container.take() else {
            bail!("node runtime already started");
        };
        let SubsystemContainer {
            router,
            supervisor,
            listener_reports,
            ..
        } = container;

        info!("===========================================");
        info!("  Tunnel-Market Node v{}", env!("CARGO_PKG_VERSION"));
        info!("  Role: {}", self.config.identity.role);
        info!("  Wallet: {}", self.config.identity.wallet);
        info!(
            "  Advertised: {}:{}",
            self.config.network.local_addr, self.config.network.local_port
        );
        info!("===========================================");

        let token = self.cancel.child_token();
        self.tasks.push((
            "message-router",
            tokio::spawn(async move {
                let stats = router.start(token).await;
                info!("[tm-01] Router exited after {} messages", stats.received);
            }),
        ));

        if let Some(supervisor) = supervisor {
            let token = self.cancel.child_token();
            self.tasks.push((
                "order-sync",
                tokio::spawn(async move {
                    let stats = supervisor.run(token).await;
                    info!("[tm-03] Sync exited after {} restarts", stats.restarts);
                }),
            ));
        }

        if let Some(reports) = listener_reports {
            let monitor = ListenerMonitor::new(reports, Arc::clone(&self.tunnels));
            let token = self.cancel.child_token();
            self.tasks.push((
                "listener-monitor",
                tokio::spawn(async move {
                    let failures = monitor.run(token).await;
                    if failures > 0 {
                        warn!("[tm-02] {} tunnel listeners failed during this run", failures);
                    }
                }),
            ));
        }

        let sampler = MetricsSampler::new(
            Arc::clone(&self.router_counters),
            Arc::clone(&self.peers),
            self.sync_counters.clone(),
            self.config.metrics_interval(),
        );
        self.tasks.push((
            "metrics-sampler",
            tokio::spawn(sampler.run(self.cancel.child_token())),
        ));

        self.started_at = Some(Utc::now());
        info!("All subsystems started ({} tasks)", self.tasks.len());
        Ok(())
    }

    /// Cancel every task, stop tunnel listeners and wait for tasks to drain.
    pub async fn shutdown(self) -> RuntimeSummary {
        info!("Initiating graceful shutdown...");
        self.cancel.cancel();
        let tunnels_stopped = self.tunnels.stop_all();

        for (name, handle) in self.tasks {
            match timeout(TASK_DRAIN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(task = name, error = %e, "Task ended abnormally"),
                Err(_) => warn!(task = name, "Task did not stop within drain timeout"),
            }
        }

        let summary = RuntimeSummary {
            router: self.router_counters.snapshot(),
            sync: self.sync_counters.as_ref().map(|c| c.snapshot()),
            tunnels_stopped,
            uptime_secs: self
                .started_at
                .map(|t| (Utc::now() - t).num_seconds())
                .unwrap_or_default(),
        };
        info!(
            received = summary.router.received,
            orders = summary.router.orders_dispatched,
            announcements = summary.router.announcements,
            tunnels_stopped,
            uptime_secs = summary.uptime_secs,
            "Shutdown complete"
        );
        summary
    }

    /// Root token. Cancelling it is equivalent to the first half of
    /// `shutdown()`.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn peers(&self) -> Arc<PeerDirectory> {
        Arc::clone(&self.peers)
    }

    pub fn router_stats(&self) -> RouterStats {
        self.router_counters.snapshot()
    }

    pub fn sync_stats(&self) -> Option<SupervisorStats> {
        self.sync_counters.as_ref().map(|c| c.snapshot())
    }

    pub fn tunnels(&self) -> Arc<TunnelRegistry> {
        Arc::clone(&self.tunnels)
    }

    /// Orders this node fulfilled, as seen by the synchronizer.
    pub fn ledger(&self) -> Arc<InMemoryOrderRepository> {
        Arc::clone(&self.ledger)
    }
}
