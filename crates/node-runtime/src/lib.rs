//! # Node Runtime Library
//!
//! Wiring and lifecycle for a tunnel-market node. The `node-runtime` binary
//! is a thin shell around [`NodeRuntime`]; the library is public so the
//! integration tests can run several nodes in one process.
//!
//! ## Layout
//!
//! - `container/` - `NodeConfig` loading and the `SubsystemContainer`
//! - `adapters/` - implementations of subsystem ports that need more than
//!   one subsystem (order bridge, metered notifier, listener monitor)
//! - `runtime` - task spawning, cancellation and shutdown

pub mod adapters;
pub mod container;
pub mod runtime;

pub use adapters::{Collaborators, TunnelRegistry};
pub use container::{ConfigError, NodeConfig, RunMode, SubsystemContainer};
pub use runtime::{NodeRuntime, RuntimeSummary};
