//! Ref-engine and CAS-engine configuration objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One ref-engine or CAS-engine declaration.
///
/// On the wire the protocol sits beside its protocol-specific properties:
/// `{"protocol": "oci-index-template-v1", "uri": "index.json"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub protocol: String,
    /// Everything except `protocol`. Opaque until a constructor narrows it.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl EngineConfig {
    pub fn new(protocol: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            protocol: protocol.into(),
            data,
        }
    }

    /// The protocol-specific properties as a JSON value.
    pub fn data_value(&self) -> Value {
        Value::Object(self.data.clone())
    }
}
