//! # Message Router
//!
//! Single event loop over three sources:
//!
//! ```text
//! inbound feed ─┐
//! heartbeat 10s ─┼─▶ select! ─▶ handle_event ─┬─▶ OrderHandler (awaited)
//! transport logs ┘                            ├─▶ PeerDirectory
//!                                             └─▶ announce ─▶ outbound
//! ```
//!
//! Events are handled strictly one at a time. When several sources are ready
//! at once, `select!` picks among them at random, so a busy inbound feed
//! cannot starve the heartbeat. Errors are logged and the offending message
//! dropped; nothing here is fatal to the loop.

use std::sync::Arc;

use shared_bus::{InboundMessage, MessagePublisher, TransportHandles};
use shared_types::{Envelope, EnvelopeKind, NodeAnnouncement};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{
    Dispatch, PeerDirectory, RouterConfig, RouterCounters, RouterError, RouterEvent, RouterStats,
};
use crate::ports::OrderHandler;
use crate::service::announcer::AnnouncementBuilder;

/// Routes pub/sub traffic for one node.
pub struct MessageRouter {
    config: RouterConfig,
    inbound: mpsc::Receiver<InboundMessage>,
    logs: mpsc::Receiver<String>,
    outbound: Arc<dyn MessagePublisher>,
    host_id: String,
    handler: Arc<dyn OrderHandler>,
    announcer: AnnouncementBuilder,
    peers: Arc<PeerDirectory>,
    counters: Arc<RouterCounters>,
}

impl MessageRouter {
    pub fn new(
        config: RouterConfig,
        transport: TransportHandles,
        handler: Arc<dyn OrderHandler>,
        announcer: AnnouncementBuilder,
    ) -> Self {
        let TransportHandles {
            inbound,
            logs,
            outbound,
            host_id,
        } = transport;

        Self {
            config,
            inbound,
            logs,
            outbound,
            host_id,
            handler,
            announcer,
            peers: Arc::new(PeerDirectory::new()),
            counters: Arc::new(RouterCounters::default()),
        }
    }

    /// Shared view of the peers learned from announcements.
    pub fn peers(&self) -> Arc<PeerDirectory> {
        Arc::clone(&self.peers)
    }

    /// Live counters, readable while the router runs.
    pub fn counters(&self) -> Arc<RouterCounters> {
        Arc::clone(&self.counters)
    }

    pub fn stats(&self) -> RouterStats {
        self.counters.snapshot()
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// Run the event loop until `cancel` fires or the inbound feed closes.
    pub async fn start(mut self, cancel: CancellationToken) -> RouterStats {
        let period = self.config.heartbeat_interval;
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut logs_open = true;

        info!(
            host_id = %self.host_id,
            wallet = %self.announcer.identity().wallet,
            heartbeat_secs = period.as_secs(),
            "Message router started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                message = self.inbound.recv() => match message {
                    Some(message) => RouterEvent::Inbound(message),
                    None => {
                        warn!("Inbound feed closed, stopping router");
                        break;
                    }
                },
                _ = heartbeat.tick() => RouterEvent::Heartbeat,
                line = self.logs.recv(), if logs_open => match line {
                    Some(line) => RouterEvent::TransportLog(line),
                    None => {
                        logs_open = false;
                        continue;
                    }
                },
            };

            self.handle_event(&cancel, event).await;
        }

        let stats = self.stats();
        info!(
            received = stats.received,
            dropped = stats.dropped,
            orders = stats.orders_dispatched,
            announcements = stats.announcements,
            "Message router stopped"
        );
        stats
    }

    /// Process a single event to completion.
    pub async fn handle_event(&self, cancel: &CancellationToken, event: RouterEvent) {
        match event {
            RouterEvent::Inbound(message) => {
                RouterCounters::bump(&self.counters.received);
                match self.receive(cancel, &message.payload).await {
                    Ok(dispatch) => debug!(sender = %message.sender, ?dispatch, "Message routed"),
                    Err(e) => {
                        RouterCounters::bump(&self.counters.dropped);
                        warn!(
                            sender = %message.sender,
                            reason = e.label(),
                            error = %e,
                            "Dropping inbound message"
                        );
                    }
                }
            }
            RouterEvent::Heartbeat => {
                if let Err(e) = self.announce().await {
                    RouterCounters::bump(&self.counters.announce_failures);
                    warn!(error = %e, "Announcement not published");
                }
                let pruned = self.peers.prune_stale(self.config.peer_ttl);
                if pruned > 0 {
                    debug!(pruned, remaining = self.peers.len(), "Pruned silent peers");
                }
            }
            RouterEvent::TransportLog(line) => {
                RouterCounters::bump(&self.counters.transport_logs);
                info!(target: "transport", "{line}");
            }
        }
    }

    /// Parse and dispatch one raw message.
    pub async fn receive(
        &self,
        cancel: &CancellationToken,
        raw: &str,
    ) -> Result<Dispatch, RouterError> {
        let envelope = Envelope::parse(raw)?;

        match envelope.kind() {
            EnvelopeKind::Order => {
                let order = envelope.decode_order()?;
                let uuid = order.uuid.clone();
                RouterCounters::bump(&self.counters.orders_dispatched);
                self.handler.handle_order(cancel, order).await?;
                Ok(Dispatch::Order { uuid })
            }
            EnvelopeKind::Node => {
                let announcement = envelope.decode_node()?;
                if announcement.peer_id == self.announcer.identity().wallet.as_str() {
                    return Ok(Dispatch::OwnAnnouncement);
                }
                let peer_id = announcement.peer_id.clone();
                let new = self.peers.record(announcement);
                RouterCounters::bump(&self.counters.peer_updates);
                if new {
                    info!(%peer_id, "Discovered peer");
                }
                Ok(Dispatch::Peer { peer_id, new })
            }
        }
    }

    /// Build and publish a fresh announcement.
    pub async fn announce(&self) -> Result<NodeAnnouncement, RouterError> {
        let failures_before = self.announcer.trace_failures();
        let announcement = self.announcer.build().await;
        if self.announcer.trace_failures() > failures_before {
            RouterCounters::bump(&self.counters.geo_trace_failures);
        }

        info!(
            host_id = %self.host_id,
            peer_id = %announcement.peer_id,
            role = %announcement.role,
            "Announcing node"
        );

        let payload = Envelope::node(&announcement)?.to_json()?;
        self.outbound.publish(payload).await?;
        RouterCounters::bump(&self.counters.announcements);
        Ok(announcement)
    }
}
