//! # Shared Bus - Pub/Sub Transport Capability
//!
//! The core never touches transport internals. It depends on exactly four
//! surfaces, bundled in [`TransportHandles`]:
//!
//! ```text
//!                ┌────────────────────────────┐
//!  inbound  ───▶ │                            │
//!  logs     ───▶ │      Message Router        │ ───▶ outbound (shared sink)
//!  host_id       │                            │        ▲
//!                └────────────────────────────┘        │
//!                                         Order Processor republish
//! ```
//!
//! Delivery is at-most-once. Each `publish` call carries one complete
//! serialized envelope; concurrent publishers may interleave whole messages
//! but never partial ones.
//!
//! [`InMemoryPubSub`] is a single-topic hub connecting several nodes inside
//! one process (development and integration tests).

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod events;
pub mod hub;
pub mod publisher;
pub mod subscriber;

pub use events::InboundMessage;
pub use hub::InMemoryPubSub;
pub use publisher::{ChannelPublisher, MessagePublisher, RecordingPublisher, TransportError};
pub use subscriber::TransportHandles;

/// Messages to buffer per member before the hub starts dropping.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Topic name used when none is configured.
pub const DEFAULT_TOPIC: &str = "tunnel-market";

