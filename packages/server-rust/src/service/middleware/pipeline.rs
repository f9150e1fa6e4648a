//! Pipeline composition: wraps the router with operation middleware.

use std::sync::Arc;

use tower::util::BoxCloneSyncService;
use tower::ServiceBuilder;

use super::metrics::{MetricsLayer, OperationMetrics};
use crate::service::operation::{Operation, OperationError, OperationResponse};
use crate::service::router::OperationRouter;

/// The fully composed, cloneable operation service driven by the HTTP
/// handler. Transport concerns (timeouts, CORS, compression) stay at the
/// HTTP layer; per-call downstream timeouts belong to the adapters.
pub type OperationPipeline = BoxCloneSyncService<Operation, OperationResponse, OperationError>;

/// Builds the operation pipeline by wrapping the router with middleware.
///
/// Layer order (outermost to innermost):
/// 1. `MetricsLayer` — timing, outcome counters, per-operation table
#[must_use]
pub fn build_operation_pipeline(
    router: OperationRouter,
    metrics: Arc<OperationMetrics>,
) -> OperationPipeline {
    let svc = ServiceBuilder::new()
        .layer(MetricsLayer::new(metrics))
        .service(router);
    BoxCloneSyncService::new(svc)
}
