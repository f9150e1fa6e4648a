//! Resolver service for the analytics domain.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use fitgate_core::{validate, OperationDef, RequestContext, ResultShape, SchemaFragment};
use serde_json::{Map, Value};
use tower::Service;

use super::{require_str, to_json};
use crate::adapters::{AdapterError, AnalyticsBackend};
use crate::service::classify::ErrorClassifier;
use crate::service::operation::{Operation, OperationError, OperationResponse};
use crate::service::retry::{RetryPolicy, Sleeper};

const CLASSIFIER: ErrorClassifier = ErrorClassifier::new("Analytics", "Stats");

type BoxedFuture = Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

/// Resolves the analytics domain's operations against its backend.
#[derive(Clone)]
pub struct AnalyticsResolvers {
    backend: Arc<dyn AnalyticsBackend>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl AnalyticsResolvers {
    pub const DOMAIN: &'static str = "analytics";

    #[must_use]
    pub fn new(
        backend: Arc<dyn AnalyticsBackend>,
        retry: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            backend,
            retry,
            sleeper,
        }
    }

    /// Root-level operations this domain contributes to the composed schema.
    #[must_use]
    pub fn fragment() -> SchemaFragment {
        SchemaFragment {
            domain: Self::DOMAIN,
            operations: vec![
                OperationDef::query("allStats", ResultShape::List),
                OperationDef::query("userStats", ResultShape::List),
                OperationDef::query("weeklyStats", ResultShape::List),
                OperationDef::query("dailyTrend", ResultShape::List),
                OperationDef::query("activitiesRange", ResultShape::List),
                OperationDef::mutation("updateActivityComment", ResultShape::Object),
            ],
        }
    }

    async fn dispatch(self, op: Operation) -> Result<OperationResponse, OperationError> {
        match op.name.as_str() {
            "allStats" => self.all_stats(&op.ctx).await,
            "userStats" => self.user_stats(&op.args, &op.ctx).await,
            "weeklyStats" => self.weekly_stats(&op.args, &op.ctx).await,
            "dailyTrend" => self.daily_trend(&op.args, &op.ctx).await,
            "activitiesRange" => self.activities_range(&op.args, &op.ctx).await,
            "updateActivityComment" => self.update_activity_comment(&op.args, &op.ctx).await,
            other => Err(OperationError::UnresolvedOperation {
                name: other.to_string(),
            }),
        }
    }

    async fn all_stats(&self, ctx: &RequestContext) -> Result<OperationResponse, OperationError> {
        let result = self
            .retry
            .execute_if(
                self.sleeper.as_ref(),
                || self.backend.all_stats(ctx),
                AdapterError::is_transient,
            )
            .await;

        reshape_list(result, "fetch all stats")
    }

    async fn user_stats(
        &self,
        args: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Result<OperationResponse, OperationError> {
        let username = validate_username(args)?;

        let result = self
            .retry
            .execute_if(
                self.sleeper.as_ref(),
                || self.backend.user_stats(&username, ctx),
                AdapterError::is_transient,
            )
            .await;

        reshape_list(result, "fetch user stats")
    }

    async fn weekly_stats(
        &self,
        args: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Result<OperationResponse, OperationError> {
        let username = validate_username(args)?;
        let range = validate_range(args)?;

        let result = self
            .retry
            .execute_if(
                self.sleeper.as_ref(),
                || {
                    self.backend
                        .weekly_stats(&username, &range.start, &range.end, ctx)
                },
                AdapterError::is_transient,
            )
            .await;

        reshape_list(result, "fetch weekly stats")
    }

    async fn daily_trend(
        &self,
        args: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Result<OperationResponse, OperationError> {
        let username = validate_username(args)?;

        let result = self
            .retry
            .execute_if(
                self.sleeper.as_ref(),
                || self.backend.daily_trend(&username, ctx),
                AdapterError::is_transient,
            )
            .await;

        reshape_list(result, "fetch daily trend stats")
    }

    async fn activities_range(
        &self,
        args: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Result<OperationResponse, OperationError> {
        let username = validate_username(args)?;
        let range = validate_range(args)?;

        let result = self
            .retry
            .execute_if(
                self.sleeper.as_ref(),
                || {
                    self.backend
                        .activities_range(&username, &range.start, &range.end, ctx)
                },
                AdapterError::is_transient,
            )
            .await;

        reshape_list(result, "fetch activities range data")
    }

    async fn update_activity_comment(
        &self,
        args: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Result<OperationResponse, OperationError> {
        let raw_id = require_str(args, "activityId")?;
        let id = validate::identifier(raw_id, "activityId")
            .map_err(fitgate_core::ClassifiedError::from)?;
        let comments = require_str(args, "comments")?;

        let result = self
            .retry
            .execute_if(
                self.sleeper.as_ref(),
                || self.backend.update_activity_comment(&id, comments, ctx),
                AdapterError::is_transient,
            )
            .await;

        match result {
            Ok(ack) => Ok(OperationResponse::Data(to_json(&ack))),
            Err(raw) => Err(CLASSIFIER.classify(&raw, "update activity comment").into()),
        }
    }
}

/// Validates the `username` argument before any downstream call.
fn validate_username(args: &Map<String, Value>) -> Result<String, OperationError> {
    let raw = require_str(args, "username")?;
    let username =
        validate::identifier(raw, "username").map_err(fitgate_core::ClassifiedError::from)?;
    Ok(username)
}

/// Validates the `startDate`/`endDate` pair before any downstream call.
fn validate_range(args: &Map<String, Value>) -> Result<fitgate_core::DateRange, OperationError> {
    let start = require_str(args, "startDate")?;
    let end = require_str(args, "endDate")?;
    let range =
        validate::date_range(start, end).map_err(fitgate_core::ClassifiedError::from)?;
    Ok(range)
}

/// Reshapes a list result: success serializes, failure classifies. The
/// router substitutes the empty list for degraded reads.
fn reshape_list<T: serde::Serialize>(
    result: Result<Vec<T>, AdapterError>,
    label: &str,
) -> Result<OperationResponse, OperationError> {
    match result {
        Ok(list) => Ok(OperationResponse::Data(to_json(&list))),
        Err(raw) => Err(CLASSIFIER.classify(&raw, label).into()),
    }
}

impl Service<Operation> for AnalyticsResolvers {
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = BoxedFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let this = self.clone();
        Box::pin(this.dispatch(op))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use fitgate_core::types::{
        ActivityRecord, CommentAck, ExerciseStats, TrendPoint, UserStats, WeeklyStats,
    };
    use fitgate_core::ErrorKind;
    use tower::ServiceExt;

    use super::*;
    use crate::adapters::ProbeResult;
    use crate::service::retry::RecordingSleeper;

    #[derive(Clone, Copy)]
    enum Script {
        Succeed,
        TimeoutAlways,
        FaultAlways { status: u16 },
    }

    struct FakeAnalytics {
        script: Script,
        calls: AtomicU32,
    }

    impl FakeAnalytics {
        fn new(script: Script) -> Self {
            Self {
                script,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn next(&self) -> Result<(), AdapterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script {
                Script::Succeed => Ok(()),
                Script::TimeoutAlways => Err(AdapterError::Timeout {
                    url: "http://analytics:5050/stats".to_string(),
                }),
                Script::FaultAlways { status } => Err(AdapterError::Status {
                    status,
                    url: "http://analytics:5050/stats".to_string(),
                }),
            }
        }

        fn canned_stats(username: &str) -> Vec<UserStats> {
            vec![UserStats {
                username: username.to_string(),
                exercises: vec![ExerciseStats {
                    exercise_type: "Running".to_string(),
                    total_duration: 120,
                }],
            }]
        }
    }

    #[async_trait]
    impl AnalyticsBackend for FakeAnalytics {
        async fn all_stats(&self, _ctx: &RequestContext) -> Result<Vec<UserStats>, AdapterError> {
            self.next().map(|()| Self::canned_stats("alice"))
        }

        async fn user_stats(
            &self,
            username: &str,
            _ctx: &RequestContext,
        ) -> Result<Vec<UserStats>, AdapterError> {
            self.next().map(|()| Self::canned_stats(username))
        }

        async fn weekly_stats(
            &self,
            _username: &str,
            start: &str,
            end: &str,
            _ctx: &RequestContext,
        ) -> Result<Vec<WeeklyStats>, AdapterError> {
            assert!(start <= end, "resolver must pass a validated range");
            self.next().map(|()| {
                vec![WeeklyStats {
                    exercise_type: "Cycling".to_string(),
                    total_duration: 90,
                }]
            })
        }

        async fn daily_trend(
            &self,
            _username: &str,
            _ctx: &RequestContext,
        ) -> Result<Vec<TrendPoint>, AdapterError> {
            self.next().map(|()| {
                vec![TrendPoint {
                    name: "Mon".to_string(),
                    duration: 30,
                    date: "2024-03-11".to_string(),
                }]
            })
        }

        async fn activities_range(
            &self,
            username: &str,
            _start: &str,
            _end: &str,
            _ctx: &RequestContext,
        ) -> Result<Vec<ActivityRecord>, AdapterError> {
            self.next().map(|()| {
                vec![ActivityRecord {
                    id: "65f400".to_string(),
                    username: username.to_string(),
                    exercise_type: "Running".to_string(),
                    description: None,
                    duration: 30,
                    date: "2024-03-11".to_string(),
                    comments: Some("nice pace".to_string()),
                }]
            })
        }

        async fn update_activity_comment(
            &self,
            _id: &str,
            _comments: &str,
            _ctx: &RequestContext,
        ) -> Result<CommentAck, AdapterError> {
            self.next().map(|()| CommentAck {
                ok: true,
                message: "Updated successfully".to_string(),
            })
        }

        async fn probe(&self) -> ProbeResult {
            ProbeResult::connected()
        }
    }

    fn resolvers(backend: Arc<FakeAnalytics>) -> AnalyticsResolvers {
        AnalyticsResolvers::new(
            backend,
            RetryPolicy::default(),
            Arc::new(RecordingSleeper::default()),
        )
    }

    fn op(name: &str, args: serde_json::Value) -> Operation {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Operation::new(name, args, RequestContext::new("req-1"))
    }

    #[tokio::test]
    async fn user_stats_returns_reshaped_list() {
        let backend = Arc::new(FakeAnalytics::new(Script::Succeed));
        let resp = resolvers(backend)
            .oneshot(op("userStats", serde_json::json!({ "username": "alice" })))
            .await
            .unwrap();

        let value = resp.into_value();
        assert_eq!(value[0]["username"], "alice");
        assert_eq!(value[0]["exercises"][0]["totalDuration"], 120);
    }

    #[tokio::test]
    async fn user_stats_times_out_twice_and_classifies_unreachable() {
        let backend = Arc::new(FakeAnalytics::new(Script::TimeoutAlways));
        let err = resolvers(backend.clone())
            .oneshot(op("userStats", serde_json::json!({ "username": "alice" })))
            .await
            .unwrap_err();

        // The router downgrades this to `[]` for list reads; the resolver
        // itself reports the classified failure.
        assert_eq!(err.to_classified().kind, ErrorKind::Unreachable);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn user_stats_rejects_malformed_username_without_downstream_call() {
        let backend = Arc::new(FakeAnalytics::new(Script::Succeed));
        let err = resolvers(backend.clone())
            .oneshot(op("userStats", serde_json::json!({ "username": "al ice" })))
            .await
            .unwrap_err();

        assert_eq!(err.to_classified().kind, ErrorKind::Invalid);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn weekly_stats_rejects_reversed_range_without_downstream_call() {
        let backend = Arc::new(FakeAnalytics::new(Script::Succeed));
        let err = resolvers(backend.clone())
            .oneshot(op(
                "weeklyStats",
                serde_json::json!({
                    "username": "bob",
                    "startDate": "2024-03-10",
                    "endDate": "2024-03-01",
                }),
            ))
            .await
            .unwrap_err();

        let classified = err.to_classified();
        assert_eq!(classified.kind, ErrorKind::Invalid);
        assert!(classified.message.contains("start date"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn weekly_stats_passes_normalized_range() {
        let backend = Arc::new(FakeAnalytics::new(Script::Succeed));
        let resp = resolvers(backend)
            .oneshot(op(
                "weeklyStats",
                serde_json::json!({
                    "username": "bob",
                    "startDate": "2024-03-01",
                    "endDate": "2024-03-07",
                }),
            ))
            .await
            .unwrap();

        assert_eq!(resp.into_value()[0]["exerciseType"], "Cycling");
    }

    #[tokio::test]
    async fn all_stats_classifies_persistent_fault() {
        let backend = Arc::new(FakeAnalytics::new(Script::FaultAlways { status: 500 }));
        let err = resolvers(backend.clone())
            .oneshot(op("allStats", serde_json::json!({})))
            .await
            .unwrap_err();

        assert_eq!(err.to_classified().kind, ErrorKind::DownstreamFault);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn daily_trend_returns_trend_points() {
        let backend = Arc::new(FakeAnalytics::new(Script::Succeed));
        let resp = resolvers(backend)
            .oneshot(op("dailyTrend", serde_json::json!({ "username": "alice" })))
            .await
            .unwrap();

        let value = resp.into_value();
        assert_eq!(value[0]["name"], "Mon");
        assert_eq!(value[0]["duration"], 30);
    }

    #[tokio::test]
    async fn activities_range_returns_journal_entries() {
        let backend = Arc::new(FakeAnalytics::new(Script::Succeed));
        let resp = resolvers(backend)
            .oneshot(op(
                "activitiesRange",
                serde_json::json!({
                    "username": "alice",
                    "startDate": "2024-03-01",
                    "endDate": "2024-03-31",
                }),
            ))
            .await
            .unwrap();

        let value = resp.into_value();
        assert_eq!(value[0]["comments"], "nice pace");
    }

    #[tokio::test]
    async fn comment_update_fails_loud_on_persistent_fault() {
        let backend = Arc::new(FakeAnalytics::new(Script::FaultAlways { status: 502 }));
        let err = resolvers(backend.clone())
            .oneshot(op(
                "updateActivityComment",
                serde_json::json!({ "activityId": "65f400", "comments": "keep it up" }),
            ))
            .await
            .unwrap_err();

        let classified = err.to_classified();
        assert_eq!(classified.kind, ErrorKind::DownstreamFault);
        assert_eq!(
            classified.message,
            "Analytics service error. Please try again later."
        );
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn comment_update_returns_ack() {
        let backend = Arc::new(FakeAnalytics::new(Script::Succeed));
        let resp = resolvers(backend)
            .oneshot(op(
                "updateActivityComment",
                serde_json::json!({ "activityId": "65f400", "comments": "keep it up" }),
            ))
            .await
            .unwrap();

        let value = resp.into_value();
        assert_eq!(value["ok"], true);
        assert_eq!(value["message"], "Updated successfully");
    }

    #[test]
    fn fragment_declares_every_operation_once() {
        let fragment = AnalyticsResolvers::fragment();
        assert_eq!(fragment.domain, "analytics");
        let names: Vec<_> = fragment.operations.iter().map(|o| o.name).collect();
        assert_eq!(
            names,
            vec![
                "allStats",
                "userStats",
                "weeklyStats",
                "dailyTrend",
                "activitiesRange",
                "updateActivityComment"
            ]
        );
    }
}
