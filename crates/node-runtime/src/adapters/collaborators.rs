//! External collaborators behind each subsystem's driven ports.
//!
//! [`Collaborators::from_config`] picks the production adapters. Tests build
//! the struct directly with mocks.

use std::sync::Arc;

use anyhow::{Context, Result};
use tm_01_message_router::{CloudflareTrace, GeoTraceSource};
use tm_02_order_processor::adapters::{IpfsGatewayStore, TcpPortProbe, TcpTunnelLauncher};
use tm_02_order_processor::{ContentStore, ListenerReport, PortAllocator, TunnelLauncher};
use tm_03_order_sync::{ClientNotifier, HttpClientNotifier, LogNotifier};
use tokio::sync::mpsc;
use tracing::info;

use crate::container::NodeConfig;

/// Listener reports buffered before launchers start waiting.
const LISTENER_REPORT_CAPACITY: usize = 64;

pub struct Collaborators {
    pub content_store: Arc<dyn ContentStore>,
    pub port_allocator: Arc<dyn PortAllocator>,
    pub launcher: Arc<dyn TunnelLauncher>,
    /// Reports from the launcher's accept loops, if it produces any.
    pub listener_reports: Option<mpsc::Receiver<ListenerReport>>,
    pub geo_trace: Arc<dyn GeoTraceSource>,
    pub notifier: Arc<dyn ClientNotifier>,
}

impl Collaborators {
    pub fn from_config(config: &NodeConfig) -> Result<Self> {
        let content_store = IpfsGatewayStore::new(config.content_store.gateway.clone())
            .context("building content gateway client")?;

        let bind_host = config.network.bind_host;
        let (reports_tx, reports_rx) = mpsc::channel(LISTENER_REPORT_CAPACITY);
        let launcher = TcpTunnelLauncher::new(bind_host, reports_tx);

        let geo_trace = CloudflareTrace::new(config.diagnostics.trace_url.clone(), config.trace_timeout())
            .context("building diagnostics client")?;

        let notifier: Arc<dyn ClientNotifier> = match &config.sync.notify_url {
            Some(url) => {
                info!(%url, "Client notifications via HTTP callback");
                Arc::new(
                    HttpClientNotifier::new(url.clone(), config.notify_timeout())
                        .context("building notification client")?,
                )
            }
            None => {
                info!("No notify_url configured, client notifications are logged only");
                Arc::new(LogNotifier::new())
            }
        };

        Ok(Self {
            content_store: Arc::new(content_store),
            port_allocator: Arc::new(TcpPortProbe::new(bind_host)),
            launcher: Arc::new(launcher),
            listener_reports: Some(reports_rx),
            geo_trace: Arc::new(geo_trace),
            notifier,
        })
    }
}
