//! # Outbound Sink
//!
//! Defines the publishing side of the transport. The sink is shared: the
//! router's heartbeat and the order processor's republish both hold an
//! `Arc<dyn MessagePublisher>`.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Errors from the outbound sink.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport side of the sink has gone away.
    #[error("Outbound sink closed")]
    Closed,

    /// The transport refused the message.
    #[error("Publish rejected: {0}")]
    Rejected(String),
}

/// Trait for publishing serialized envelopes to the topic.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish one complete serialized envelope.
    async fn publish(&self, payload: String) -> Result<(), TransportError>;

    /// Total messages accepted by this sink.
    fn messages_published(&self) -> u64;
}

/// Sink backed by a tokio mpsc channel drained by the transport.
pub struct ChannelPublisher {
    sender: mpsc::Sender<String>,
    published: AtomicU64,
}

impl ChannelPublisher {
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self {
            sender,
            published: AtomicU64::new(0),
        }
    }

    /// Create a sink together with the receiver the transport drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl MessagePublisher for ChannelPublisher {
    async fn publish(&self, payload: String) -> Result<(), TransportError> {
        let len = payload.len();
        self.sender
            .send(payload)
            .await
            .map_err(|_| TransportError::Closed)?;
        self.published.fetch_add(1, Ordering::Relaxed);
        debug!(bytes = len, "Message handed to transport");
        Ok(())
    }

    fn messages_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

/// Sink that keeps every published message in memory.
///
/// Used by tests and dry runs; can be switched to reject publishes to
/// exercise failure paths.
#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<String>>,
    reject: Mutex<Option<TransportError>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail with `error`.
    pub fn fail_with(&self, error: TransportError) {
        *self.reject.lock() = Some(error);
    }

    /// Snapshot of everything published so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    async fn publish(&self, payload: String) -> Result<(), TransportError> {
        if let Some(error) = self.reject.lock().clone() {
            return Err(error);
        }
        self.messages.lock().push(payload);
        Ok(())
    }

    fn messages_published(&self) -> u64 {
        self.messages.lock().len() as u64
    }
}
