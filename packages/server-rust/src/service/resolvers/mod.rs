//! Domain resolver services.
//!
//! Each domain contributes one `tower::Service<Operation>` over its backend
//! trait plus the schema fragment it registers at composition time. A
//! resolver runs validate → retry-wrapped adapter call → reshape, applying
//! the fail-soft/fail-loud asymmetry: reads degrade to their shape's empty
//! value when the downstream stays broken, mutations surface the classified
//! error.

pub mod activity;
pub mod analytics;

use fitgate_core::ClassifiedError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

pub use activity::ActivityResolvers;
pub use analytics::AnalyticsResolvers;

/// Extracts a required string argument.
pub(crate) fn require_str<'a>(
    args: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a str, ClassifiedError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ClassifiedError::invalid(format!("missing or non-string argument `{key}`")))
}

/// Extracts and deserializes a required structured argument.
pub(crate) fn parse_arg<T: DeserializeOwned>(
    args: &Map<String, Value>,
    key: &'static str,
) -> Result<T, ClassifiedError> {
    let raw = args
        .get(key)
        .ok_or_else(|| ClassifiedError::invalid(format!("missing argument `{key}`")))?;
    serde_json::from_value(raw.clone())
        .map_err(|e| ClassifiedError::invalid(format!("invalid argument `{key}`: {e}")))
}

/// Serializes a resolver result into the response value.
///
/// The derived `Serialize` impls on the domain types cannot fail; a `Null`
/// fallback keeps the non-test code free of unwraps all the same.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
