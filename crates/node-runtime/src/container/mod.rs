//! # Subsystem Container
//!
//! Configuration snapshot plus the wired subsystem instances.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig, RunMode};
pub use subsystems::SubsystemContainer;
