//! # Service Layer

pub mod announcer;
pub mod router;

pub use announcer::{AnnouncementBuilder, NodeIdentity};
pub use router::MessageRouter;
