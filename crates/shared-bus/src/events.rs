//! # Inbound Messages
//!
//! What the transport hands the router: a raw payload and the identity of
//! the peer that published it.

/// One message received from the topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    /// Host identity of the publishing peer.
    pub sender: String,
    /// Raw serialized envelope.
    pub payload: String,
}

impl InboundMessage {
    pub fn new(sender: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            payload: payload.into(),
        }
    }
}
