//! # Core Domain Entities
//!
//! - [`WalletAddress`]: identity a provider fulfils orders for
//! - [`TunnelOrder`]: request to provision a tunnel for a content descriptor
//! - [`NodeAnnouncement`]: periodic self description used for discovery
//! - [`GeoTrace`]: best-effort location metadata attached to announcements
//! - [`ServiceDescriptor`]: what a tunnel listener should expose
//! - [`OrderStatusRecord`]: locally persisted order awaiting payment

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::WireError;

/// Wallet account string, e.g. `0x1B4b…4413`.
///
/// Comparison is exact string equality; no checksum normalisation is
/// applied, so the configured wallet must match what clients send.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A request to provision a tunnel.
///
/// `port` is `0` until exactly one provider (the one whose wallet matches)
/// fulfils the order and republishes it with the assigned port.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelOrder {
    /// Order identifier chosen by the client.
    pub uuid: String,
    /// Wallet of the provider this order is addressed to.
    pub wallet: WalletAddress,
    /// Content identifier of the [`ServiceDescriptor`].
    pub server_cid: String,
    /// Assigned tunnel port, `0` while unassigned.
    #[serde(default)]
    pub port: u16,
}

impl TunnelOrder {
    pub fn new(
        uuid: impl Into<String>,
        wallet: impl Into<WalletAddress>,
        server_cid: impl Into<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            wallet: wallet.into(),
            server_cid: server_cid.into(),
            port: 0,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.port != 0
    }

    /// Copy of this order carrying the assigned port.
    pub fn with_port(&self, port: u16) -> Self {
        Self {
            port,
            ..self.clone()
        }
    }
}

/// Role a node advertises on the bus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    #[default]
    Provider,
    Client,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Provider => f.write_str("provider"),
            NodeRole::Client => f.write_str("client"),
        }
    }
}

impl std::str::FromStr for NodeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "provider" => Ok(NodeRole::Provider),
            "client" => Ok(NodeRole::Client),
            other => Err(format!("unknown node role: {other}")),
        }
    }
}

/// Best-effort diagnostic location of a node.
///
/// Every field is empty when the lookup failed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoTrace {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub loc: String,
    #[serde(default)]
    pub colo: String,
}

impl GeoTrace {
    pub fn is_empty(&self) -> bool {
        self.ip.is_empty() && self.loc.is_empty() && self.colo.is_empty()
    }
}

/// Self description broadcast every heartbeat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAnnouncement {
    /// Wallet account of the announcing node.
    pub peer_id: String,
    /// Advertised address.
    pub addr: String,
    /// Advertised base port. Tunnels are opened on `port + 1`.
    pub port: u16,
    /// Asking price per order.
    pub price: u64,
    #[serde(rename = "type")]
    pub role: NodeRole,
    #[serde(default)]
    pub metadata: GeoTrace,
}

impl NodeAnnouncement {
    pub fn is_provider(&self) -> bool {
        self.role == NodeRole::Provider
    }
}

/// Descriptor fetched from the content store for one order.
///
/// Only `target_host`/`target_port` are interpreted by the tunnel listener;
/// the remaining fields are carried for listeners that terminate TLS.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    #[serde(default)]
    pub name: String,
    pub target_host: String,
    pub target_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_pem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_pem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_pem: Option<String>,
}

impl ServiceDescriptor {
    /// Decode and validate raw content-store bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let descriptor: ServiceDescriptor = serde_json::from_slice(bytes)
            .map_err(|e| WireError::InvalidDescriptor(e.to_string()))?;

        if descriptor.target_host.trim().is_empty() {
            return Err(WireError::InvalidDescriptor("empty target_host".into()));
        }
        if descriptor.target_port == 0 {
            return Err(WireError::InvalidDescriptor("target_port is 0".into()));
        }
        Ok(descriptor)
    }

    /// `host:port` of the upstream service.
    pub fn target_addr(&self) -> String {
        format!("{}:{}", self.target_host, self.target_port)
    }
}

/// Payment state of a locally recorded order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    AwaitingPayment,
    Paid,
    Notified,
    Expired,
}

/// Persisted order as seen by the synchronizer. Read-only outside the
/// persistence layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderStatusRecord {
    pub uuid: String,
    pub status: OrderStatus,
    /// Time since the order was recorded.
    pub elapsed: Duration,
}
