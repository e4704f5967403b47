//! # TM-01 Message Router
//!
//! Owns the node's pub/sub traffic: classifies inbound envelopes, hands
//! orders to the order handler, tracks peers from their announcements and
//! publishes this node's own announcement every heartbeat.
//!
//! ## Event Sources
//!
//! | Source | Event | Handling |
//! |--------|-------|----------|
//! | Inbound feed | `RouterEvent::Inbound` | `order` → `OrderHandler`, `node` → `PeerDirectory` |
//! | 10s timer | `RouterEvent::Heartbeat` | build + publish `NodeAnnouncement`, prune silent peers |
//! | Transport log feed | `RouterEvent::TransportLog` | logged |
//!
//! ## Guarantees
//!
//! - A `node` envelope never invokes the order handler.
//! - One event is processed at a time; order handling is awaited inline.
//! - No inbound message can stop the loop. Only cancellation or a closed
//!   inbound feed does.
//! - A failed geo lookup never suppresses an announcement.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{CloudflareTrace, DEFAULT_TRACE_TIMEOUT, DEFAULT_TRACE_URL};
pub use domain::{
    parse_trace, Dispatch, GeoTraceError, HandlerError, PeerDirectory, PeerEntry, RouterConfig,
    RouterCounters, RouterError, RouterEvent, RouterStats, DEFAULT_HEARTBEAT_INTERVAL,
    DEFAULT_PEER_TTL,
};
pub use ports::{GeoTraceSource, OrderHandler};
pub use service::{AnnouncementBuilder, MessageRouter, NodeIdentity};
