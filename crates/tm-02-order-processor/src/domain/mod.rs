//! # Domain Layer
//!
//! Order pipeline stages, errors and the values passed between ports.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
