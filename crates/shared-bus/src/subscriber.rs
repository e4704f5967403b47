//! # Transport Handles
//!
//! The four-surface capability a node is given by its transport.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::events::InboundMessage;
use crate::publisher::MessagePublisher;

/// Everything the core needs from a transport.
///
/// `inbound` and `logs` have a single consumer (the message router); the
/// outbound sink is cloned into every component that publishes.
pub struct TransportHandles {
    /// Messages published by other peers on the topic.
    pub inbound: mpsc::Receiver<InboundMessage>,
    /// Diagnostic lines emitted by the transport itself.
    pub logs: mpsc::Receiver<String>,
    /// Shared outbound sink.
    pub outbound: Arc<dyn MessagePublisher>,
    /// Stable identity of this host on the transport.
    pub host_id: String,
}

impl TransportHandles {
    pub fn new(
        inbound: mpsc::Receiver<InboundMessage>,
        logs: mpsc::Receiver<String>,
        outbound: Arc<dyn MessagePublisher>,
        host_id: impl Into<String>,
    ) -> Self {
        Self {
            inbound,
            logs,
            outbound,
            host_id: host_id.into(),
        }
    }
}

impl std::fmt::Debug for TransportHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportHandles")
            .field("host_id", &self.host_id)
            .field("published", &self.outbound.messages_published())
            .finish_non_exhaustive()
    }
}
