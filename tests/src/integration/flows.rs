//! # Provider Order Flow
//!
//! One provider node with real TCP collaborators, driven over the
//! in-memory topic:
//!
//! ```text
//! client app ──order──→ [tm-01] router ──→ bridge ──→ [tm-02] processor
//!                                                        │ probe base+1
//!                                                        │ bind listener
//! observer ←──order(port = base+1)── topic ←─────────────┘ republish
//! ```

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;
    use std::time::Duration;

    use node_runtime::{Collaborators, NodeRuntime};
    use shared_bus::InMemoryPubSub;
    use shared_types::{NodeRole, TunnelOrder};
    use tm_02_order_processor::adapters::{TcpPortProbe, TcpTunnelLauncher};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use crate::integration::support::*;

    const WAIT: Duration = Duration::from_secs(5);

    // =========================================================================
    // FIXTURES
    // =========================================================================

    struct ProviderNode {
        hub: InMemoryPubSub,
        runtime: NodeRuntime,
        store: Arc<DescriptorStore>,
        base_port: u16,
    }

    async fn provider_node() -> ProviderNode {
        let upstream = echo_server().await;
        let base_port = free_base_port().await;
        let store = Arc::new(
            DescriptorStore::default().with(ECHO_CID, &descriptor("127.0.0.1", upstream)),
        );

        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let (launcher, reports) = {
            let (tx, rx) = tokio::sync::mpsc::channel(8);
            (TcpTunnelLauncher::new(localhost, tx), rx)
        };
        let collaborators = Collaborators {
            content_store: store.clone(),
            port_allocator: Arc::new(TcpPortProbe::new(localhost)),
            launcher: Arc::new(launcher),
            listener_reports: Some(reports),
            geo_trace: Arc::new(FixedTrace(frankfurt())),
            notifier: Arc::new(RecordingNotifier::default()),
        };

        let hub = InMemoryPubSub::new();
        let config = node_config(NodeRole::Provider, PROVIDER_WALLET, base_port);
        let mut runtime = NodeRuntime::new(config, hub.join("provider-1"), collaborators);
        runtime.start().unwrap();

        ProviderNode {
            hub,
            runtime,
            store,
            base_port,
        }
    }

    // =========================================================================
    // FULFILLMENT
    // =========================================================================

    #[tokio::test]
    async fn test_provider_opens_working_tunnel_for_its_order() {
        let node = provider_node().await;
        let mut observer = node.hub.join("observer");

        let order = TunnelOrder::new("order-1", PROVIDER_WALLET, ECHO_CID);
        node.hub.inject("client-app", order_message(&order));

        let fulfilled = next_fulfilled(&mut observer.inbound, WAIT)
            .await
            .expect("fulfilled order republished");
        assert_eq!(fulfilled.uuid, "order-1");
        assert_eq!(fulfilled.port, node.base_port + 1);
        assert_eq!(fulfilled.server_cid, ECHO_CID);

        let mut stream = TcpStream::connect(("127.0.0.1", fulfilled.port)).await.unwrap();
        stream.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        let tunnels = node.runtime.tunnels();
        let ledger = node.runtime.ledger();
        assert!(eventually(WAIT, || tunnels.port_of("order-1") == Some(fulfilled.port)).await);
        assert_eq!(ledger.len(), 1);

        let summary = node.runtime.shutdown().await;
        assert_eq!(summary.tunnels_stopped, 1);
        assert_eq!(summary.router.orders_dispatched, 1);
        assert_eq!(summary.router.dropped, 0);
    }

    #[tokio::test]
    async fn test_republished_order_keeps_double_encoding() {
        let node = provider_node().await;
        let mut observer = node.hub.join("observer");

        node.hub.inject(
            "client-app",
            order_message(&TunnelOrder::new("order-2", PROVIDER_WALLET, ECHO_CID)),
        );

        let envelope = next_fulfilled_envelope(&mut observer.inbound, WAIT)
            .await
            .expect("fulfilled order republished");
        assert!(envelope.data().is_string());

        node.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_legacy_envelope_with_inline_order_is_fulfilled() {
        let node = provider_node().await;
        let mut observer = node.hub.join("observer");

        let legacy = serde_json::json!({
            "type": "order",
            "data": {
                "uuid": "order-3",
                "wallet": PROVIDER_WALLET,
                "server_cid": ECHO_CID,
            }
        });
        node.hub.inject("legacy-client", legacy.to_string());

        let fulfilled = next_fulfilled(&mut observer.inbound, WAIT)
            .await
            .expect("fulfilled order republished");
        assert_eq!(fulfilled.uuid, "order-3");
        assert_eq!(fulfilled.port, node.base_port + 1);

        node.runtime.shutdown().await;
    }

    // =========================================================================
    // REJECTION
    // =========================================================================

    #[tokio::test]
    async fn test_order_for_another_wallet_touches_nothing() {
        let node = provider_node().await;

        node.hub.inject(
            "client-app",
            order_message(&TunnelOrder::new("order-4", "0xSOMEONE_ELSE", ECHO_CID)),
        );

        let runtime = &node.runtime;
        assert!(eventually(WAIT, || runtime.router_stats().dropped == 1).await);
        assert_eq!(node.store.fetches(), 0);
        assert!(runtime.tunnels().is_empty());
        assert!(runtime.ledger().is_empty());

        node.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_descriptor_opens_no_tunnel() {
        let node = provider_node().await;

        node.hub.inject(
            "client-app",
            order_message(&TunnelOrder::new("order-5", PROVIDER_WALLET, "bafy-unknown")),
        );

        let runtime = &node.runtime;
        assert!(eventually(WAIT, || runtime.router_stats().dropped == 1).await);
        assert_eq!(node.store.fetches(), 1);
        assert!(runtime.tunnels().is_empty());
        assert!(runtime.ledger().is_empty());

        node.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_garbage_on_the_topic_is_survived() {
        let node = provider_node().await;
        let mut observer = node.hub.join("observer");

        node.hub.inject("noise", "not json");
        node.hub.inject("noise", r#"{"kind":"chat","data":"hi"}"#);
        node.hub.inject(
            "client-app",
            order_message(&TunnelOrder::new("order-6", PROVIDER_WALLET, ECHO_CID)),
        );

        let fulfilled = next_fulfilled(&mut observer.inbound, WAIT)
            .await
            .expect("router still running");
        assert_eq!(fulfilled.uuid, "order-6");

        let summary = node.runtime.shutdown().await;
        assert_eq!(summary.router.dropped, 2);
    }
}
