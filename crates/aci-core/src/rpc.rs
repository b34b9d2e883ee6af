// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON-RPC 2.0 envelope primitives.
//!
//! Only the pieces the message algebra embeds live here: request ids and
//! wire-level error objects. Frame parsing itself belongs to the codec.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The `jsonrpc` field value every frame must carry.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC request id.
///
/// `Null` is a distinct, legal id and is not the same thing as an absent
/// `id` field (which makes a frame a notification). Equality is structural,
/// and the derived ordering and hashing make ids usable as correlation-map
/// keys.
///
/// # Examples
///
/// ```
/// use aci_core::JsonRpcId;
///
/// let id: JsonRpcId = serde_json::from_str("7").unwrap();
/// assert_eq!(id, JsonRpcId::Number(7));
///
/// let id: JsonRpcId = serde_json::from_str("null").unwrap();
/// assert_eq!(id, JsonRpcId::Null);
/// assert_eq!(serde_json::to_string(&id).unwrap(), "null");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcId {
    /// Integer id. Fractional ids are rejected at the envelope layer.
    Number(i64),
    /// String id.
    Str(String),
    /// The literal JSON `null` used as an id.
    Null,
}

impl JsonRpcId {
    /// Short human-readable rendering for findings and error messages.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Str(s) => format!("\"{s}\""),
            Self::Null => "null".to_string(),
        }
    }
}

impl fmt::Display for JsonRpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<i64> for JsonRpcId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for JsonRpcId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

/// A JSON-RPC error object arriving on the wire.
///
/// This is protocol data, not a failure of this library: error frames
/// decode into `Error` message variants and pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code as defined by JSON-RPC 2.0 or the peer.
    pub code: i64,
    /// Human-readable error description.
    pub message: String,
    /// Optional structured error detail, preserved verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// Construct an error object without structured detail.
    #[must_use]
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrips_each_shape() {
        for (json, id) in [
            ("42", JsonRpcId::Number(42)),
            ("\"req-1\"", JsonRpcId::Str("req-1".into())),
            ("null", JsonRpcId::Null),
        ] {
            let decoded: JsonRpcId = serde_json::from_str(json).unwrap();
            assert_eq!(decoded, id);
            assert_eq!(serde_json::to_string(&decoded).unwrap(), json);
        }
    }

    #[test]
    fn null_id_is_distinct_from_numbers_and_strings() {
        assert_ne!(JsonRpcId::Null, JsonRpcId::Number(0));
        assert_ne!(JsonRpcId::Null, JsonRpcId::Str(String::new()));
        assert_ne!(JsonRpcId::Number(1), JsonRpcId::Str("1".into()));
    }

    #[test]
    fn error_object_preserves_data() {
        let raw = r#"{"code":-32601,"message":"method not found","data":{"method":"x"}}"#;
        let err: JsonRpcError = serde_json::from_str(raw).unwrap();
        assert_eq!(err.code, -32601);
        let back = serde_json::to_value(&err).unwrap();
        assert_eq!(back["data"]["method"], "x");
    }
}
