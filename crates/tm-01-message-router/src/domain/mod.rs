//! # Domain Layer
//!
//! - `events`: `RouterEvent`, `Dispatch`, `RouterStats`
//! - `peers`: `PeerDirectory`
//! - `trace`: diagnostic trace parsing
//! - `errors`: `RouterError`, `HandlerError`, `GeoTraceError`

pub mod errors;
pub mod events;
pub mod peers;
pub mod trace;

pub use errors::*;
pub use events::*;
pub use peers::{PeerDirectory, PeerEntry};
pub use trace::parse_trace;
