//! # Shared Types Crate
//!
//! Domain entities and the pub/sub wire format shared by the router, the
//! order processor and the order-status synchronizer.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a crate boundary or
//!   the network is defined here.
//! - **Kind decides decoding**: an [`Envelope`]'s `kind` fully determines how
//!   its `data` is decoded. A mismatch is a [`WireError`], never a panic.
//! - **Wallet is authority**: a [`TunnelOrder`] carries the provider wallet it
//!   is addressed to; no other field grants authority.

pub mod entities;
pub mod envelope;
pub mod errors;

pub use entities::*;
pub use envelope::{Envelope, EnvelopeKind};
pub use errors::*;
