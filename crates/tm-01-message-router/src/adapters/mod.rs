//! # Adapters Layer

pub mod cloudflare;

pub use cloudflare::{CloudflareTrace, DEFAULT_TRACE_TIMEOUT, DEFAULT_TRACE_URL};
