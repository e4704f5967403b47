//! Collaborator mocks and helpers shared by the integration flows.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use node_runtime::{Collaborators, NodeConfig};
use parking_lot::Mutex;
use shared_bus::InboundMessage;
use shared_types::{Envelope, EnvelopeKind, GeoTrace, NodeRole, ServiceDescriptor, TunnelOrder};
use tm_01_message_router::{GeoTraceError, GeoTraceSource};
use tm_02_order_processor::{
    ContentStore, ContentStoreError, LaunchError, PortAllocator, PortError, TunnelHandle,
    TunnelLauncher, TunnelSpec,
};
use tm_03_order_sync::{ClientNotifier, SyncError};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

pub const PROVIDER_WALLET: &str = "0xPROVIDER";
pub const CLIENT_WALLET: &str = "0xCLIENT";
pub const ECHO_CID: &str = "bafy-echo-service";

// =============================================================================
// CONTENT STORE
// =============================================================================

/// Serves descriptors from a fixed map and counts every fetch.
#[derive(Default)]
pub struct DescriptorStore {
    descriptors: HashMap<String, Vec<u8>>,
    fetches: AtomicUsize,
}

impl DescriptorStore {
    pub fn with(mut self, cid: &str, descriptor: &ServiceDescriptor) -> Self {
        let bytes = serde_json::to_vec(descriptor).expect("descriptor serializes");
        self.descriptors.insert(cid.to_string(), bytes);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for DescriptorStore {
    async fn fetch(&self, cid: &str) -> Result<Vec<u8>, ContentStoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.descriptors
            .get(cid)
            .cloned()
            .ok_or_else(|| ContentStoreError::NotFound(cid.to_string()))
    }
}

pub fn descriptor(host: &str, port: u16) -> ServiceDescriptor {
    ServiceDescriptor {
        name: "echo".into(),
        target_host: host.into(),
        target_port: port,
        protocol: Some("tcp".into()),
        ca_pem: None,
        cert_pem: None,
        key_pem: None,
    }
}

// =============================================================================
// PORTS AND LISTENERS
// =============================================================================

pub struct FreePorts;

#[async_trait]
impl PortAllocator for FreePorts {
    async fn probe(&self, _port: u16) -> Result<(), PortError> {
        Ok(())
    }
}

/// Accepts every spec without binding anything.
#[derive(Default)]
pub struct InstantLauncher {
    pub launched: Mutex<Vec<TunnelSpec>>,
}

#[async_trait]
impl TunnelLauncher for InstantLauncher {
    async fn launch(
        &self,
        spec: TunnelSpec,
        cancel: CancellationToken,
    ) -> Result<TunnelHandle, LaunchError> {
        let port = spec.port;
        self.launched.lock().push(spec);
        Ok(TunnelHandle::new(port, cancel))
    }
}

/// Upstream service that echoes every byte back.
pub async fn echo_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut rd, mut wr) = stream.split();
                let _ = tokio::io::copy(&mut rd, &mut wr).await;
            });
        }
    });
    port
}

/// A base port whose tunnel port (`base + 1`) was free a moment ago.
pub async fn free_base_port() -> u16 {
    loop {
        let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = probe.local_addr().unwrap().port();
        if port > 1 {
            return port - 1;
        }
    }
}

// =============================================================================
// DIAGNOSTICS AND NOTIFICATIONS
// =============================================================================

pub struct FixedTrace(pub GeoTrace);

#[async_trait]
impl GeoTraceSource for FixedTrace {
    async fn trace(&self) -> Result<GeoTrace, GeoTraceError> {
        Ok(self.0.clone())
    }
}

pub fn frankfurt() -> GeoTrace {
    GeoTrace {
        ip: "203.0.113.7".into(),
        loc: "DE".into(),
        colo: "FRA".into(),
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notified: Mutex<Vec<String>>,
}

#[async_trait]
impl ClientNotifier for RecordingNotifier {
    async fn notify(&self, uuid: &str) -> Result<(), SyncError> {
        self.notified.lock().push(uuid.to_string());
        Ok(())
    }
}

// =============================================================================
// NODES
// =============================================================================

pub fn node_config(role: NodeRole, wallet: &str, local_port: u16) -> Arc<NodeConfig> {
    let mut config = NodeConfig::default();
    config.identity.role = role;
    config.identity.wallet = wallet.to_string();
    config.network.local_addr = "127.0.0.1".into();
    config.network.local_port = local_port;
    Arc::new(config)
}

/// Collaborators with no network access at all.
pub fn offline_collaborators(
    store: Arc<DescriptorStore>,
    notifier: Arc<RecordingNotifier>,
) -> Collaborators {
    Collaborators {
        content_store: store,
        port_allocator: Arc::new(FreePorts),
        launcher: Arc::new(InstantLauncher::default()),
        listener_reports: None,
        geo_trace: Arc::new(FixedTrace(frankfurt())),
        notifier,
    }
}

// =============================================================================
// OBSERVATION
// =============================================================================

/// Next order envelope on the topic that carries an assigned port. Unassigned
/// orders and announcements are skipped.
pub async fn next_fulfilled_envelope(
    inbound: &mut mpsc::Receiver<InboundMessage>,
    within: Duration,
) -> Option<Envelope> {
    timeout(within, async {
        while let Some(message) = inbound.recv().await {
            let Ok(envelope) = Envelope::parse(&message.payload) else {
                continue;
            };
            if envelope.kind() != EnvelopeKind::Order {
                continue;
            }
            if envelope.decode_order().is_ok_and(|order| order.is_assigned()) {
                return Some(envelope);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

pub async fn next_fulfilled(
    inbound: &mut mpsc::Receiver<InboundMessage>,
    within: Duration,
) -> Option<TunnelOrder> {
    next_fulfilled_envelope(inbound, within)
        .await
        .and_then(|envelope| envelope.decode_order().ok())
}

pub fn order_message(order: &TunnelOrder) -> String {
    Envelope::order(order).unwrap().to_json().unwrap()
}

/// Poll `check` every 10ms until it holds or `within` elapses.
pub async fn eventually<F>(within: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    timeout(within, async {
        loop {
            if check() {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}
