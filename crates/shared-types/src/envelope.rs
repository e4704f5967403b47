//! # Pub/Sub Envelope
//!
//! Every message on the bus is a JSON object `{"kind": …, "data": …}`.
//!
//! ## Wire Asymmetry
//!
//! - `node`: `data` is the announcement as a JSON object.
//! - `order`: `data` is a JSON *string* containing the serialized order.
//!
//! Existing peers emit the double-encoded order form, so it is preserved
//! byte-for-byte on the way out. Decoding is lenient: the legacy `type`
//! field name is accepted in place of `kind`, and an order given as an
//! inline object decodes the same as the string form.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{NodeAnnouncement, TunnelOrder};
use crate::errors::WireError;

/// Closed set of envelope kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    Order,
    Node,
}

impl EnvelopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeKind::Order => "order",
            EnvelopeKind::Node => "node",
        }
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wire message. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Envelope {
    kind: EnvelopeKind,
    data: Value,
}

/// Inbound shape, tolerant of the legacy field name and of unknown kinds
/// (reported as [`WireError::UnknownKind`] rather than a generic parse
/// failure).
#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(alias = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl Envelope {
    /// Wrap an order, double-encoding it as a JSON string.
    pub fn order(order: &TunnelOrder) -> Result<Self, WireError> {
        let encoded = serde_json::to_string(order)?;
        Ok(Self {
            kind: EnvelopeKind::Order,
            data: Value::String(encoded),
        })
    }

    /// Wrap a node announcement as a native JSON object.
    pub fn node(announcement: &NodeAnnouncement) -> Result<Self, WireError> {
        Ok(Self {
            kind: EnvelopeKind::Node,
            data: serde_json::to_value(announcement)?,
        })
    }

    /// Parse a raw bus message.
    pub fn parse(raw: &str) -> Result<Self, WireError> {
        let raw: RawEnvelope =
            serde_json::from_str(raw).map_err(|e| WireError::Malformed(e.to_string()))?;

        let kind = match raw.kind.as_str() {
            "order" => EnvelopeKind::Order,
            "node" => EnvelopeKind::Node,
            other => return Err(WireError::UnknownKind(other.to_string())),
        };

        Ok(Self {
            kind,
            data: raw.data,
        })
    }

    pub fn kind(&self) -> EnvelopeKind {
        self.kind
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Serialize for the outbound sink.
    pub fn to_json(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode the order carried by an `order` envelope.
    pub fn decode_order(&self) -> Result<TunnelOrder, WireError> {
        self.expect_kind(EnvelopeKind::Order)?;

        let decoded = match &self.data {
            Value::String(inner) => serde_json::from_str(inner),
            Value::Object(_) => serde_json::from_value(self.data.clone()),
            other => {
                return Err(WireError::InvalidPayload {
                    kind: EnvelopeKind::Order,
                    reason: format!("expected string or object, got {}", json_type(other)),
                })
            }
        };

        decoded.map_err(|e| WireError::InvalidPayload {
            kind: EnvelopeKind::Order,
            reason: e.to_string(),
        })
    }

    /// Decode the announcement carried by a `node` envelope.
    pub fn decode_node(&self) -> Result<NodeAnnouncement, WireError> {
        self.expect_kind(EnvelopeKind::Node)?;

        serde_json::from_value(self.data.clone()).map_err(|e| WireError::InvalidPayload {
            kind: EnvelopeKind::Node,
            reason: e.to_string(),
        })
    }

    fn expect_kind(&self, expected: EnvelopeKind) -> Result<(), WireError> {
        if self.kind != expected {
            return Err(WireError::KindMismatch {
                expected,
                actual: self.kind,
            });
        }
        Ok(())
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
