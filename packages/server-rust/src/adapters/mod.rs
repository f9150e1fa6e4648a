//! Downstream service adapters.
//!
//! Each adapter translates one logical operation into one outbound HTTP call
//! against a specific backend and normalizes the response shape. The trait
//! seam (`ActivityBackend`, `AnalyticsBackend`) lets resolvers run against
//! fakes in tests; the production impls are thin reqwest clients with
//! per-call timeouts owned here, not by the dispatch core.

pub mod activity;
pub mod analytics;

use async_trait::async_trait;
use fitgate_core::types::{
    ActivityRecord, CommentAck, Exercise, ExerciseInput, TrendPoint, UserStats, WeeklyStats,
};
use fitgate_core::RequestContext;

pub use activity::{ActivityAdapter, ActivityAdapterConfig};
pub use analytics::{AnalyticsAdapter, AnalyticsAdapterConfig};

// ---------------------------------------------------------------------------
// AdapterError
// ---------------------------------------------------------------------------

/// Raw failure from one downstream call attempt.
///
/// Retains the attempted URL for operator logs; classification into the
/// caller-safe vocabulary is a separate concern (`service::classify`).
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The host could not be reached (connection refused, DNS failure).
    #[error("connection to {url} failed: {detail}")]
    Connect { url: String, detail: String },
    /// The call exceeded the adapter's bounded timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },
    /// The downstream answered with a non-success status.
    #[error("{url} responded with status {status}")]
    Status { status: u16, url: String },
    /// The downstream answered 2xx but the body did not match the contract.
    #[error("could not decode response from {url}: {detail}")]
    Decode { url: String, detail: String },
    /// Anything reqwest reports that fits none of the above.
    #[error("request to {url} failed: {detail}")]
    Other { url: String, detail: String },
}

impl AdapterError {
    /// The URL the failed attempt targeted.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Connect { url, .. }
            | Self::Timeout { url }
            | Self::Status { url, .. }
            | Self::Decode { url, .. }
            | Self::Other { url, .. } => url,
        }
    }

    /// HTTP status, when the downstream answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// Connection failures, timeouts, and 5xx responses are transient;
    /// 4xx responses and contract mismatches are terminal.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connect { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode { .. } | Self::Other { .. } => false,
        }
    }

    /// Maps a reqwest transport error onto the adapter taxonomy.
    pub(crate) fn from_reqwest(err: &reqwest::Error, url: &str) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            Self::Timeout { url }
        } else if err.is_connect() {
            Self::Connect {
                url,
                detail: err.to_string(),
            }
        } else if err.is_decode() {
            Self::Decode {
                url,
                detail: err.to_string(),
            }
        } else {
            Self::Other {
                url,
                detail: err.to_string(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Health probes
// ---------------------------------------------------------------------------

/// Outcome of one health probe against a downstream service.
///
/// Probes are never retried: a probe failure is reported immediately so the
/// composed health surface reflects the current state.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub connected: bool,
    /// Raw failure detail when disconnected. Health output only; never part
    /// of an operation response.
    pub detail: Option<String>,
}

impl ProbeResult {
    #[must_use]
    pub fn connected() -> Self {
        Self {
            connected: true,
            detail: None,
        }
    }

    #[must_use]
    pub fn disconnected(detail: impl Into<String>) -> Self {
        Self {
            connected: false,
            detail: Some(detail.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Backend traits
// ---------------------------------------------------------------------------

/// Logical operations against the activity-record service.
#[async_trait]
pub trait ActivityBackend: Send + Sync {
    async fn list_exercises(&self, ctx: &RequestContext) -> Result<Vec<Exercise>, AdapterError>;

    /// Returns `Ok(None)` when the record does not exist; a 404 here is an
    /// expected answer, not a failure.
    async fn get_exercise(
        &self,
        id: &str,
        ctx: &RequestContext,
    ) -> Result<Option<Exercise>, AdapterError>;

    async fn add_exercise(
        &self,
        input: &ExerciseInput,
        ctx: &RequestContext,
    ) -> Result<Exercise, AdapterError>;

    async fn update_exercise(
        &self,
        id: &str,
        input: &ExerciseInput,
        ctx: &RequestContext,
    ) -> Result<Exercise, AdapterError>;

    /// Returns the backend's confirmation message.
    async fn delete_exercise(
        &self,
        id: &str,
        ctx: &RequestContext,
    ) -> Result<String, AdapterError>;

    async fn probe(&self) -> ProbeResult;
}

/// Logical operations against the analytics/stats service.
#[async_trait]
pub trait AnalyticsBackend: Send + Sync {
    async fn all_stats(&self, ctx: &RequestContext) -> Result<Vec<UserStats>, AdapterError>;

    async fn user_stats(
        &self,
        username: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<UserStats>, AdapterError>;

    async fn weekly_stats(
        &self,
        username: &str,
        start: &str,
        end: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<WeeklyStats>, AdapterError>;

    async fn daily_trend(
        &self,
        username: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<TrendPoint>, AdapterError>;

    async fn activities_range(
        &self,
        username: &str,
        start: &str,
        end: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<ActivityRecord>, AdapterError>;

    async fn update_activity_comment(
        &self,
        id: &str,
        comments: &str,
        ctx: &RequestContext,
    ) -> Result<CommentAck, AdapterError>;

    async fn probe(&self) -> ProbeResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_split_matches_retry_policy() {
        let connect = AdapterError::Connect {
            url: "http://a/x".to_string(),
            detail: "refused".to_string(),
        };
        let timeout = AdapterError::Timeout {
            url: "http://a/x".to_string(),
        };
        let fault = AdapterError::Status {
            status: 503,
            url: "http://a/x".to_string(),
        };
        assert!(connect.is_transient());
        assert!(timeout.is_transient());
        assert!(fault.is_transient());

        let not_found = AdapterError::Status {
            status: 404,
            url: "http://a/x".to_string(),
        };
        let bad_request = AdapterError::Status {
            status: 400,
            url: "http://a/x".to_string(),
        };
        let decode = AdapterError::Decode {
            url: "http://a/x".to_string(),
            detail: "missing field".to_string(),
        };
        assert!(!not_found.is_transient());
        assert!(!bad_request.is_transient());
        assert!(!decode.is_transient());
    }

    #[test]
    fn url_and_status_are_preserved_for_logs() {
        let err = AdapterError::Status {
            status: 500,
            url: "http://analytics:5050/stats".to_string(),
        };
        assert_eq!(err.url(), "http://analytics:5050/stats");
        assert_eq!(err.status(), Some(500));

        let err = AdapterError::Timeout {
            url: "http://activity:5300/exercises".to_string(),
        };
        assert_eq!(err.status(), None);
    }
}
