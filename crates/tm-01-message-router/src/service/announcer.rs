//! Heartbeat announcement assembly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use shared_types::{GeoTrace, NodeAnnouncement, NodeRole, WalletAddress};
use tracing::warn;

use crate::ports::GeoTraceSource;

/// Static part of every announcement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeIdentity {
    pub wallet: WalletAddress,
    pub addr: String,
    pub port: u16,
    pub price: u64,
    pub role: NodeRole,
}

/// Builds a fresh [`NodeAnnouncement`] for each heartbeat.
pub struct AnnouncementBuilder {
    identity: NodeIdentity,
    geo: Arc<dyn GeoTraceSource>,
    trace_failures: AtomicU64,
}

impl AnnouncementBuilder {
    pub fn new(identity: NodeIdentity, geo: Arc<dyn GeoTraceSource>) -> Self {
        Self {
            identity,
            geo,
            trace_failures: AtomicU64::new(0),
        }
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Never fails: a failed trace lookup leaves the geo fields empty.
    pub async fn build(&self) -> NodeAnnouncement {
        let metadata = match self.geo.trace().await {
            Ok(trace) => trace,
            Err(e) => {
                self.trace_failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Geo trace lookup failed, announcing without location");
                GeoTrace::default()
            }
        };

        NodeAnnouncement {
            peer_id: self.identity.wallet.to_string(),
            addr: self.identity.addr.clone(),
            port: self.identity.port,
            price: self.identity.price,
            role: self.identity.role,
            metadata,
        }
    }

    pub fn trace_failures(&self) -> u64 {
        self.trace_failures.load(Ordering::Relaxed)
    }
}
