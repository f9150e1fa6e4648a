//! Metrics middleware for operations.
//!
//! Instruments every dispatched operation with a tracing span, emits
//! counters and a duration histogram through the `metrics` facade, and keeps
//! an in-process per-operation table the health surface can snapshot.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use dashmap::DashMap;
use serde::Serialize;
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::service::operation::{Operation, OperationError, OperationResponse};

// ---------------------------------------------------------------------------
// OperationMetrics
// ---------------------------------------------------------------------------

/// Per-operation call counters, keyed by root-level operation name.
#[derive(Debug, Default)]
pub struct OperationMetrics {
    table: DashMap<String, OperationCounters>,
}

/// Counters for a single operation name.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct OperationCounters {
    pub calls: u64,
    pub failures: u64,
}

impl OperationMetrics {
    pub fn record(&self, operation: &str, ok: bool) {
        let mut entry = self.table.entry(operation.to_string()).or_default();
        entry.calls += 1;
        if !ok {
            entry.failures += 1;
        }
    }

    /// Current counters, sorted by operation name for stable output.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, OperationCounters)> {
        let mut entries: Vec<_> = self
            .table
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments operations with timing and outcome.
#[derive(Debug, Clone)]
pub struct MetricsLayer {
    metrics: Arc<OperationMetrics>,
}

impl MetricsLayer {
    #[must_use]
    pub fn new(metrics: Arc<OperationMetrics>) -> Self {
        Self { metrics }
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService {
            inner,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper recording operation duration and outcome.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
    metrics: Arc<OperationMetrics>,
}

impl<S> Service<Operation> for MetricsService<S>
where
    S: Service<Operation, Response = OperationResponse, Error = OperationError> + Send,
    S::Future: Send + 'static,
{
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let operation = op.name.clone();
        let request_id = op.ctx.request_id.clone();
        let metrics = Arc::clone(&self.metrics);

        let span = info_span!(
            "operation",
            operation = %operation,
            request_id = %request_id,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(op);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let elapsed = start.elapsed();

                let outcome = match &result {
                    Ok(_) => "ok",
                    Err(_) => "error",
                };

                metrics.record(&operation, result.is_ok());
                metrics::counter!(
                    "gateway_operations_total",
                    "operation" => operation.clone(),
                    "outcome" => outcome,
                )
                .increment(1);
                metrics::histogram!(
                    "gateway_operation_duration_seconds",
                    "operation" => operation.clone(),
                )
                .record(elapsed.as_secs_f64());

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = elapsed.as_millis() as u64;
                tracing::Span::current().record("duration_ms", duration_ms);
                tracing::Span::current().record("outcome", outcome);

                tracing::info!(
                    operation = %operation,
                    duration_ms,
                    outcome,
                    "operation complete"
                );

                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use fitgate_core::{ClassifiedError, RequestContext};
    use serde_json::Map;
    use tower::ServiceExt;

    use super::*;

    #[derive(Clone)]
    struct ScriptedService {
        fail: bool,
    }

    impl Service<Operation> for ScriptedService {
        type Response = OperationResponse;
        type Error = OperationError;
        type Future =
            Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _op: Operation) -> Self::Future {
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(OperationError::Rejected(ClassifiedError::invalid("nope")))
                } else {
                    Ok(OperationResponse::Data(serde_json::json!(null)))
                }
            })
        }
    }

    fn op(name: &str) -> Operation {
        Operation::new(name, Map::new(), RequestContext::new("req-1"))
    }

    #[tokio::test]
    async fn records_success_and_failure_counters() {
        let metrics = Arc::new(OperationMetrics::default());
        let layer = MetricsLayer::new(Arc::clone(&metrics));

        let ok_svc = layer.layer(ScriptedService { fail: false });
        ok_svc.oneshot(op("userStats")).await.unwrap();

        let err_svc = layer.layer(ScriptedService { fail: true });
        err_svc.oneshot(op("userStats")).await.unwrap_err();
        let err_svc = layer.layer(ScriptedService { fail: true });
        err_svc.oneshot(op("addExercise")).await.unwrap_err();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].0, "addExercise");
        assert_eq!(snapshot[0].1.calls, 1);
        assert_eq!(snapshot[0].1.failures, 1);
        assert_eq!(snapshot[1].0, "userStats");
        assert_eq!(snapshot[1].1.calls, 2);
        assert_eq!(snapshot[1].1.failures, 1);
    }

    #[tokio::test]
    async fn passes_response_through_unchanged() {
        let metrics = Arc::new(OperationMetrics::default());
        let svc = MetricsLayer::new(metrics).layer(ScriptedService { fail: false });
        let resp = svc.oneshot(op("exercises")).await.unwrap();
        assert_eq!(resp.into_value(), serde_json::json!(null));
    }
}
