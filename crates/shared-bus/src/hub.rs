//! # In-Memory Pub/Sub Hub
//!
//! A single topic shared by several nodes in one process. Each member gets
//! its own [`TransportHandles`]; a message published by one member is
//! delivered to every other member, never back to its publisher.
//!
//! Uses `tokio::sync::broadcast` underneath, so a slow member loses
//! messages instead of blocking the topic. Losses are reported on that
//! member's log feed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::events::InboundMessage;
use crate::publisher::{MessagePublisher, TransportError};
use crate::subscriber::TransportHandles;
use crate::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_TOPIC};

const LOG_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Debug)]
struct Published {
    from: String,
    payload: String,
}

/// Single-topic pub/sub fabric.
pub struct InMemoryPubSub {
    topic: String,
    sender: broadcast::Sender<Published>,
    capacity: usize,
}

impl InMemoryPubSub {
    #[must_use]
    pub fn new() -> Self {
        Self::with_topic(DEFAULT_TOPIC, DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_topic(topic: impl Into<String>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            topic: topic.into(),
            sender,
            capacity,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Number of members currently attached.
    pub fn member_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Attach a node to the topic.
    ///
    /// Spawns the member's forwarding task, so it must be called from inside
    /// a tokio runtime. The task ends when the member drops its inbound
    /// receiver.
    pub fn join(&self, host_id: impl Into<String>) -> TransportHandles {
        let host_id = host_id.into();
        let mut feed = self.sender.subscribe();
        let (inbound_tx, inbound_rx) = mpsc::channel(self.capacity);
        let (log_tx, log_rx) = mpsc::channel(LOG_CHANNEL_CAPACITY);

        push_log(&log_tx, &host_id, format!("joined topic {} as {}", self.topic, host_id));

        let me = host_id.clone();
        tokio::spawn(async move {
            loop {
                match feed.recv().await {
                    Ok(msg) if msg.from == me => continue,
                    Ok(msg) => {
                        let inbound = InboundMessage::new(msg.from, msg.payload);
                        if inbound_tx.send(inbound).await.is_err() {
                            debug!(host = %me, "Member detached from topic");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        let line = format!("lagged behind topic, {n} messages dropped");
                        push_log(&log_tx, &me, line);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let outbound = Arc::new(HubPublisher {
            from: host_id.clone(),
            sender: self.sender.clone(),
            published: AtomicU64::new(0),
        });

        TransportHandles::new(inbound_rx, log_rx, outbound, host_id)
    }

    /// Publish on behalf of an arbitrary sender that is not a member.
    ///
    /// Returns the number of members the message reached.
    pub fn inject(&self, from: impl Into<String>, payload: impl Into<String>) -> usize {
        self.sender
            .send(Published {
                from: from.into(),
                payload: payload.into(),
            })
            .unwrap_or(0)
    }
}

/// Log lines are best effort; a full or detached log feed loses the line.
fn push_log(log_tx: &mpsc::Sender<String>, host: &str, line: String) {
    match log_tx.try_send(line) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(line)) => {
            debug!(%host, %line, "Log feed full, line dropped");
        }
        Err(mpsc::error::TrySendError::Closed(line)) => {
            debug!(%host, %line, "Log feed detached, line dropped");
        }
    }
}

impl Default for InMemoryPubSub {
    fn default() -> Self {
        Self::new()
    }
}

struct HubPublisher {
    from: String,
    sender: broadcast::Sender<Published>,
    published: AtomicU64,
}

#[async_trait]
impl MessagePublisher for HubPublisher {
    async fn publish(&self, payload: String) -> Result<(), TransportError> {
        let msg = Published {
            from: self.from.clone(),
            payload,
        };
        // At-most-once: with no listeners the message is simply gone.
        match self.sender.send(msg) {
            Ok(receivers) => debug!(from = %self.from, receivers, "Published to topic"),
            Err(_) => debug!(from = %self.from, "Published to empty topic"),
        }
        self.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn messages_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_message_reaches_other_members_only() {
        let hub = InMemoryPubSub::new();
        let mut alice = hub.join("alice");
        let mut bob = hub.join("bob");

        alice.outbound.publish("hello".into()).await.unwrap();

        let got = timeout(Duration::from_secs(1), bob.inbound.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, InboundMessage::new("alice", "hello"));

        // Nothing echoed back to the publisher.
        assert!(timeout(Duration::from_millis(50), alice.inbound.recv())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_join_emits_log_line() {
        let hub = InMemoryPubSub::with_topic("orders", 8);
        let mut node = hub.join("n1");

        let line = node.logs.recv().await.unwrap();
        assert_eq!(line, "joined topic orders as n1");
        assert_eq!(hub.member_count(), 1);
    }

    #[tokio::test]
    async fn test_lag_is_reported_on_log_feed() {
        let hub = InMemoryPubSub::with_topic("orders", 2);
        let mut node = hub.join("n1");
        assert_eq!(node.logs.recv().await.unwrap(), "joined topic orders as n1");

        for i in 0..10 {
            hub.inject("remote", format!("m{i}"));
        }

        let line = timeout(Duration::from_secs(1), node.logs.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(line, "lagged behind topic, 8 messages dropped");
        assert_eq!(node.inbound.recv().await.unwrap().payload, "m8");
    }

    #[tokio::test]
    async fn test_detached_log_feed_does_not_stop_delivery() {
        let hub = InMemoryPubSub::with_topic("orders", 2);
        let TransportHandles {
            mut inbound, logs, ..
        } = hub.join("n1");
        drop(logs);

        for i in 0..10 {
            hub.inject("remote", format!("m{i}"));
        }

        let first = timeout(Duration::from_secs(1), inbound.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.payload, "m8");
        assert_eq!(inbound.recv().await.unwrap().payload, "m9");
    }

    #[tokio::test]
    async fn test_inject_from_outside() {
        let hub = InMemoryPubSub::new();
        let mut node = hub.join("n1");

        assert_eq!(hub.inject("remote", "{}"), 1);
        let got = node.inbound.recv().await.unwrap();
        assert_eq!(got.sender, "remote");
    }
}
