//! # Error Types
//!
//! Errors raised while encoding or decoding wire data.

use thiserror::Error;

use crate::envelope::EnvelopeKind;

/// Errors from the pub/sub wire format.
///
/// All variants are validation errors: the offending message is logged and
/// dropped by the receiver, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Raw bytes are not a JSON envelope.
    #[error("Malformed envelope: {0}")]
    Malformed(String),

    /// Envelope kind is not one this node understands.
    #[error("Unknown envelope kind: {0}")]
    UnknownKind(String),

    /// Caller asked for a payload the envelope kind does not carry.
    #[error("Kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        expected: EnvelopeKind,
        actual: EnvelopeKind,
    },

    /// Envelope kind is valid but `data` does not decode into it.
    #[error("Invalid {kind} payload: {reason}")]
    InvalidPayload { kind: EnvelopeKind, reason: String },

    /// Content-store bytes do not describe a usable service.
    #[error("Invalid service descriptor: {0}")]
    InvalidDescriptor(String),

    /// Serialization of an outbound value failed.
    #[error("Encoding failed: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for WireError {
    fn from(err: serde_json::Error) -> Self {
        WireError::Encode(err.to_string())
    }
}
