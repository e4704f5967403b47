//! # Peer Directory
//!
//! Latest announcement per peer, fed by `node` envelopes. Peers are never
//! told to leave; a peer that stops announcing simply ages out through
//! [`PeerDirectory::prune_stale`].

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use shared_types::NodeAnnouncement;
use tokio::time::Instant;

/// One known peer.
#[derive(Clone, Debug)]
pub struct PeerEntry {
    pub announcement: NodeAnnouncement,
    pub last_seen: Instant,
}

/// Thread-safe map of `peer_id` to its latest announcement.
#[derive(Debug, Default)]
pub struct PeerDirectory {
    entries: RwLock<HashMap<String, PeerEntry>>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `announcement`, replacing any earlier one from the same peer.
    ///
    /// Returns `true` if the peer was not known before.
    pub fn record(&self, announcement: NodeAnnouncement) -> bool {
        let peer_id = announcement.peer_id.clone();
        let entry = PeerEntry {
            announcement,
            last_seen: Instant::now(),
        };
        self.entries.write().insert(peer_id, entry).is_none()
    }

    pub fn get(&self, peer_id: &str) -> Option<PeerEntry> {
        self.entries.read().get(peer_id).cloned()
    }

    /// Provider announcements, cheapest first.
    pub fn providers(&self) -> Vec<NodeAnnouncement> {
        let mut providers: Vec<NodeAnnouncement> = self
            .entries
            .read()
            .values()
            .filter(|entry| entry.announcement.is_provider())
            .map(|entry| entry.announcement.clone())
            .collect();
        providers.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.peer_id.cmp(&b.peer_id)));
        providers
    }

    /// Drop peers not heard from within `max_age`. Returns how many were removed.
    pub fn prune_stale(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.last_seen) <= max_age);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
