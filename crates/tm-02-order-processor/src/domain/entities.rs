//! # Processor Entities

use std::time::Duration;

use shared_types::{ServiceDescriptor, TunnelOrder, WalletAddress};
use tokio_util::sync::CancellationToken;

/// Descriptor fetch deadline.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Processor settings, taken from the node's configuration snapshot.
#[derive(Clone, Debug)]
pub struct ProcessorConfig {
    /// Orders are fulfilled only when addressed to this wallet.
    pub wallet: WalletAddress,
    /// Advertised base port; tunnels open on `base_port + 1`.
    pub base_port: u16,
    /// Upper bound on a single descriptor fetch.
    pub fetch_timeout: Duration,
}

impl ProcessorConfig {
    pub fn new(wallet: impl Into<WalletAddress>, base_port: u16) -> Self {
        Self {
            wallet: wallet.into(),
            base_port,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// The single port candidate for tunnels, if there is one.
    pub fn tunnel_port(&self) -> Option<u16> {
        self.base_port.checked_add(1)
    }
}

/// What a launcher needs to start one tunnel listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TunnelSpec {
    pub order_uuid: String,
    pub port: u16,
    pub descriptor: ServiceDescriptor,
}

/// A running tunnel listener.
///
/// Dropping the handle does not stop the listener; call [`TunnelHandle::stop`]
/// or cancel the parent token.
#[derive(Clone, Debug)]
pub struct TunnelHandle {
    port: u16,
    cancel: CancellationToken,
}

impl TunnelHandle {
    pub fn new(port: u16, cancel: CancellationToken) -> Self {
        Self { port, cancel }
    }

    /// Port the listener is actually bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Result of a successful fulfillment.
#[derive(Clone, Debug)]
pub struct FulfilledOrder {
    /// The order as republished, carrying the assigned port.
    pub order: TunnelOrder,
    pub descriptor: ServiceDescriptor,
    pub tunnel: TunnelHandle,
}

/// How a tunnel listener ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListenerOutcome {
    /// Stopped through its cancellation token.
    Stopped,
    /// Accept loop failed after a successful start.
    Failed(String),
}

/// Report sent by a listener's accept loop when it ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerReport {
    pub order_uuid: String,
    pub port: u16,
    pub outcome: ListenerOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tunnel_port_is_base_plus_one() {
        assert_eq!(ProcessorConfig::new("0x1", 7000).tunnel_port(), Some(7001));
        assert_eq!(ProcessorConfig::new("0x1", u16::MAX).tunnel_port(), None);
    }

    #[test]
    fn test_handle_stop() {
        let handle = TunnelHandle::new(7001, CancellationToken::new());
        assert!(!handle.is_stopped());
        handle.clone().stop();
        assert!(handle.is_stopped());
    }
}
