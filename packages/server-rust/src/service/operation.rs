//! Operation envelope and error types for the dispatch pipeline.

use fitgate_core::{ClassifiedError, ErrorKind, RequestContext};
use serde_json::{Map, Value};

/// One inbound unit of work flowing through the pipeline: the root-level
/// operation name, its JSON argument object, and the per-call context.
#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub args: Map<String, Value>,
    pub ctx: RequestContext,
}

impl Operation {
    #[must_use]
    pub fn new(name: impl Into<String>, args: Map<String, Value>, ctx: RequestContext) -> Self {
        Self {
            name: name.into(),
            args,
            ctx,
        }
    }
}

/// Successful resolver output: the result value, not yet nested under the
/// operation name (the HTTP handler does that).
#[derive(Debug, Clone)]
pub enum OperationResponse {
    Data(Value),
}

impl OperationResponse {
    /// Unwraps the result value.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Data(value) => value,
        }
    }
}

/// Errors surfaced by the dispatch pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OperationError {
    /// The name is not part of the composed schema: a caller error.
    #[error("unknown operation: {name}")]
    UnknownOperation { name: String },
    /// The name is in the composed schema but no resolver service claims its
    /// domain. Cannot happen once composition validation has passed; treated
    /// as an internal configuration error.
    #[error("operation `{name}` has no registered resolver")]
    UnresolvedOperation { name: String },
    /// A validation failure or a fail-loud downstream failure, already
    /// reduced to the caller-safe vocabulary.
    #[error(transparent)]
    Rejected(#[from] ClassifiedError),
}

impl OperationError {
    /// The caller-safe form rendered into the response `errors` array.
    #[must_use]
    pub fn to_classified(&self) -> ClassifiedError {
        match self {
            Self::UnknownOperation { name } => {
                ClassifiedError::invalid(format!("unknown operation: {name}"))
            }
            Self::UnresolvedOperation { name } => ClassifiedError::new(
                ErrorKind::Unknown,
                format!("operation `{name}` is not available"),
            ),
            Self::Rejected(classified) => classified.clone(),
        }
    }
}
