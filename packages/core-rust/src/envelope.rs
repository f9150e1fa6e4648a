//! Wire envelopes for the unified query endpoint.
//!
//! An inbound body names one operation with a JSON argument object; the
//! response is `{ data }` on success or `{ data: null, errors: [...] }`
//! when a failure is surfaced. Successful data is nested under the
//! operation's root-level name.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ClassifiedError;

/// Inbound request: one named operation plus its argument object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRequest {
    /// Root-level operation name in the composed schema.
    pub operation: String,
    /// JSON-shaped argument object. Absent means no arguments.
    #[serde(default)]
    pub args: Map<String, Value>,
}

/// Outbound response: `{ data } | { data, errors }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub data: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ClassifiedError>,
}

impl GatewayResponse {
    /// Successful response with `value` nested under the operation name.
    #[must_use]
    pub fn success(operation: &str, value: Value) -> Self {
        let mut data = Map::new();
        data.insert(operation.to_string(), value);
        Self {
            data: Value::Object(data),
            errors: Vec::new(),
        }
    }

    /// Failure response: null data plus the classified error.
    #[must_use]
    pub fn failure(error: ClassifiedError) -> Self {
        Self {
            data: Value::Null,
            errors: vec![error],
        }
    }
}
