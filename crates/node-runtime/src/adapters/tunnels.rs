//! Registry of running tunnel listeners.

use std::collections::HashMap;

use parking_lot::Mutex;
use tm_02_order_processor::TunnelHandle;

/// Tunnel handles keyed by order uuid.
#[derive(Debug, Default)]
pub struct TunnelRegistry {
    tunnels: Mutex<HashMap<String, TunnelHandle>>,
}

impl TunnelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a listener. A handle already registered for the uuid is stopped
    /// and replaced.
    pub fn insert(&self, order_uuid: impl Into<String>, handle: TunnelHandle) {
        if let Some(previous) = self.tunnels.lock().insert(order_uuid.into(), handle) {
            previous.stop();
        }
    }

    /// Forget a listener whose accept loop has ended.
    ///
    /// Only removes the entry if it still refers to `port`, so a report from
    /// a replaced listener cannot evict its successor.
    pub fn release(&self, order_uuid: &str, port: u16) -> bool {
        let mut tunnels = self.tunnels.lock();
        match tunnels.get(order_uuid) {
            Some(handle) if handle.port() == port => {
                tunnels.remove(order_uuid);
                true
            }
            _ => false,
        }
    }

    pub fn port_of(&self, order_uuid: &str) -> Option<u16> {
        self.tunnels.lock().get(order_uuid).map(TunnelHandle::port)
    }

    pub fn len(&self) -> usize {
        self.tunnels.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tunnels.lock().is_empty()
    }

    /// Stop every listener. Returns how many were running.
    pub fn stop_all(&self) -> usize {
        let drained: Vec<TunnelHandle> = self.tunnels.lock().drain().map(|(_, h)| h).collect();
        for handle in &drained {
            handle.stop();
        }
        drained.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_replacing_a_tunnel_stops_the_old_one() {
        let registry = TunnelRegistry::new();
        let first = TunnelHandle::new(7001, CancellationToken::new());
        registry.insert("u-1", first.clone());
        registry.insert("u-1", TunnelHandle::new(7002, CancellationToken::new()));

        assert!(first.is_stopped());
        assert_eq!(registry.port_of("u-1"), Some(7002));
        assert!(!registry.release("u-1", 7001));
        assert!(registry.release("u-1", 7002));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_stop_all_cancels_handles() {
        let registry = TunnelRegistry::new();
        let handle = TunnelHandle::new(7001, CancellationToken::new());
        registry.insert("u-1", handle.clone());

        assert_eq!(registry.stop_all(), 1);
        assert!(handle.is_stopped());
        assert_eq!(registry.len(), 0);
    }
}
