//! # Two-Node Market
//!
//! A client and a provider share one topic. Timelines run on a paused
//! tokio clock, so heartbeat and sync intervals elapse instantly.
//!
//! ```text
//! t=10s   both nodes announce; each learns the other
//! t=10s+  order injected → provider fulfils → client sees assigned port
//! t=30s   provider sync worker polls its ledger
//! t=35s   client notified (after notify_delay)
//! ```

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use node_runtime::{NodeConfig, NodeRuntime};
    use shared_bus::InMemoryPubSub;
    use shared_types::{NodeRole, TunnelOrder};
    use tokio::time::sleep;

    use crate::integration::support::*;

    const WAIT: Duration = Duration::from_secs(5);

    // =========================================================================
    // FIXTURES
    // =========================================================================

    struct Market {
        hub: InMemoryPubSub,
        provider: NodeRuntime,
        client: NodeRuntime,
        store: Arc<DescriptorStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn market_with(provider_config: NodeConfig) -> Market {
        let hub = InMemoryPubSub::new();
        let store = Arc::new(
            DescriptorStore::default().with(ECHO_CID, &descriptor("10.0.0.5", 8080)),
        );
        let notifier = Arc::new(RecordingNotifier::default());

        let mut provider = NodeRuntime::new(
            Arc::new(provider_config),
            hub.join("provider-host"),
            offline_collaborators(store.clone(), notifier.clone()),
        );
        let mut client = NodeRuntime::new(
            node_config(NodeRole::Client, CLIENT_WALLET, 7100),
            hub.join("client-host"),
            offline_collaborators(
                Arc::new(DescriptorStore::default()),
                Arc::new(RecordingNotifier::default()),
            ),
        );
        provider.start().unwrap();
        client.start().unwrap();

        Market {
            hub,
            provider,
            client,
            store,
            notifier,
        }
    }

    fn market() -> Market {
        market_with((*node_config(NodeRole::Provider, PROVIDER_WALLET, 7000)).clone())
    }

    // =========================================================================
    // DISCOVERY
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_nodes_discover_each_other_on_heartbeat() {
        let m = market();
        assert!(m.client.peers().is_empty());

        sleep(Duration::from_secs(11)).await;

        let providers = m.client.peers().providers();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].peer_id, PROVIDER_WALLET);
        assert_eq!(providers[0].port, 7000);
        assert_eq!(providers[0].metadata.loc, "DE");

        // The client is known to the provider but is not offering tunnels.
        let provider_peers = m.provider.peers();
        assert!(provider_peers.get(CLIENT_WALLET).is_some());
        assert!(provider_peers.providers().is_empty());

        m.client.shutdown().await;
        m.provider.shutdown().await;
    }

    // =========================================================================
    // ORDER LIFECYCLE
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_order_fulfilled_and_client_notified() {
        let m = market();
        let mut observer = m.hub.join("observer");

        m.hub.inject(
            "client-app",
            order_message(&TunnelOrder::new("order-1", PROVIDER_WALLET, ECHO_CID)),
        );

        let fulfilled = next_fulfilled(&mut observer.inbound, WAIT)
            .await
            .expect("provider republishes the order");
        assert_eq!(fulfilled.port, 7001);

        // Injected unassigned order plus the republished one.
        let client = &m.client;
        assert!(eventually(WAIT, || client.router_stats().orders_dispatched == 2).await);
        assert!(client.ledger().is_empty());
        assert_eq!(m.store.fetches(), 1);

        sleep(Duration::from_secs(40)).await;
        assert_eq!(*m.notifier.notified.lock(), vec!["order-1".to_string()]);

        let provider = m.provider.shutdown().await;
        assert_eq!(provider.tunnels_stopped, 1);
        let sync = provider.sync.expect("sync enabled");
        assert_eq!(sync.notifications_sent, 1);
        assert_eq!(sync.restarts, 0);
        m.client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_assigned_orders_are_not_fulfilled_again() {
        let m = market();

        let already_assigned =
            TunnelOrder::new("order-2", PROVIDER_WALLET, ECHO_CID).with_port(7001);
        m.hub.inject("client-app", order_message(&already_assigned));

        let provider = &m.provider;
        assert!(eventually(WAIT, || provider.router_stats().orders_dispatched == 1).await);
        assert_eq!(m.store.fetches(), 0);
        assert!(provider.tunnels().is_empty());

        m.provider.shutdown().await;
        m.client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unpaid_order_ages_out_of_sync() {
        let mut config = (*node_config(NodeRole::Provider, PROVIDER_WALLET, 7000)).clone();
        config.sync.max_age_secs = 40;
        let m = market_with(config);

        m.hub.inject(
            "client-app",
            order_message(&TunnelOrder::new("order-3", PROVIDER_WALLET, ECHO_CID)),
        );
        let provider = &m.provider;
        assert!(eventually(WAIT, || provider.ledger().len() == 1).await);

        // Polls at 30s (notify) and 60s, 90s (too old).
        sleep(Duration::from_secs(100)).await;
        assert_eq!(*m.notifier.notified.lock(), vec!["order-3".to_string()]);

        m.provider.shutdown().await;
        m.client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_peer_is_pruned() {
        let m = market();
        sleep(Duration::from_secs(11)).await;
        assert_eq!(m.client.peers().providers().len(), 1);

        m.provider.shutdown().await;

        // Default peer TTL is 60s; pruning runs on the client's heartbeat.
        sleep(Duration::from_secs(75)).await;
        assert!(m.client.peers().providers().is_empty());

        m.client.shutdown().await;
    }
}
