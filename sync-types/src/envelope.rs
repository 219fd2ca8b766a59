//! Envelope - the JSON-RPC 2.0 wrapper around every message on the channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::MontoError;

/// JSON-RPC version marker carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC message as read off the channel.
///
/// Requests carry an `id` and a `method`, responses an `id` and no
/// `method`, notifications a `method` and no `id`. Only notifications are
/// of interest here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Version marker, must be "2.0"
    pub jsonrpc: String,
    /// Request/response correlation id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Method name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Method parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Envelope {
    /// Build a notification envelope.
    pub fn notification(method: &str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: Some(method.to_string()),
            params: Some(params),
        }
    }

    /// Whether this envelope is a notification (method, no id).
    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.method.is_some()
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MontoError> {
        serde_json::to_vec(self).map_err(MontoError::Serialization)
    }

    /// Deserialize from JSON bytes, checking the version marker.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MontoError> {
        let envelope: Self = serde_json::from_slice(bytes).map_err(MontoError::Deserialization)?;
        if envelope.jsonrpc != JSONRPC_VERSION {
            return Err(MontoError::UnsupportedVersion(envelope.jsonrpc));
        }
        Ok(envelope)
    }
}
