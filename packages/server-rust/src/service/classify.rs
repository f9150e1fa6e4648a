//! Error classification: raw downstream failures to the caller-safe
//! vocabulary.
//!
//! Classification always happens after the retry policy has given up and
//! before any message reaches the caller. The raw failure (domain, attempted
//! URL, status, operation) is logged for operator diagnosis; the returned
//! message is generic by design — transport detail never leaks outward.

use fitgate_core::{ClassifiedError, ErrorKind};
use tracing::error;

use crate::adapters::AdapterError;

/// Per-domain classifier carrying the labels used in outward messages.
#[derive(Debug, Clone, Copy)]
pub struct ErrorClassifier {
    /// Domain label for availability messages (e.g. `"Activity"`).
    domain_label: &'static str,
    /// Resource label for not-found messages (e.g. `"Exercise"`).
    resource_label: &'static str,
}

impl ErrorClassifier {
    #[must_use]
    pub const fn new(domain_label: &'static str, resource_label: &'static str) -> Self {
        Self {
            domain_label,
            resource_label,
        }
    }

    /// Reduces a raw failure to exactly one stable (kind, message) pair.
    ///
    /// - connection-level failure or timeout → `Unreachable`
    /// - not-found signal → `NotFound`
    /// - server-side fault signal → `DownstreamFault`
    /// - anything else → `Unknown`, naming the attempted operation
    #[must_use]
    pub fn classify(&self, raw: &AdapterError, operation_label: &str) -> ClassifiedError {
        error!(
            domain = self.domain_label,
            url = raw.url(),
            status = raw.status(),
            operation = operation_label,
            error = %raw,
            "downstream call failed"
        );

        match raw {
            AdapterError::Connect { .. } | AdapterError::Timeout { .. } => ClassifiedError::new(
                ErrorKind::Unreachable,
                format!(
                    "{} service is currently unavailable. Please try again later.",
                    self.domain_label
                ),
            ),
            AdapterError::Status { status: 404, .. } => ClassifiedError::new(
                ErrorKind::NotFound,
                format!("{} not found.", self.resource_label),
            ),
            AdapterError::Status { status, .. } if *status >= 500 => ClassifiedError::new(
                ErrorKind::DownstreamFault,
                format!(
                    "{} service error. Please try again later.",
                    self.domain_label
                ),
            ),
            other => ClassifiedError::new(
                ErrorKind::Unknown,
                format!("Failed to {operation_label}: {other}"),
            ),
        }
    }
}
