//! Stable, caller-safe error vocabulary.
//!
//! Every failure that reaches a caller is first reduced to a
//! [`ClassifiedError`]: a (kind, message) pair drawn from a small taxonomy.
//! Raw transport detail (hostnames, status lines, stack traces) stays in
//! operator logs and never appears in the outward message.

use serde::{Deserialize, Serialize};

/// Uniform failure taxonomy across all downstream domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Connection-level failure: the downstream host could not be reached.
    Unreachable,
    /// The downstream responded with a not-found signal. Terminal; never
    /// retried.
    NotFound,
    /// The downstream responded with a server-side fault signal.
    DownstreamFault,
    /// Caller error: the input failed validation before any downstream call.
    Invalid,
    /// Catch-all for failures outside the taxonomy.
    Unknown,
}

impl ErrorKind {
    /// Stable string form used in response bodies and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unreachable => "Unreachable",
            Self::NotFound => "NotFound",
            Self::DownstreamFault => "DownstreamFault",
            Self::Invalid => "Invalid",
            Self::Unknown => "Unknown",
        }
    }
}

/// A stable (kind, message) pair derived from a raw failure.
///
/// Constructed once per failed operation and returned to the caller;
/// never retried further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{}: {message}", .kind.as_str())]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClassifiedError {
    /// Creates a classified error with the given kind and message.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a caller-input validation failure.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invalid, message)
    }
}
