//! HTTP handlers and shared application state.

pub mod graphql;
pub mod health;

use std::sync::Arc;
use std::time::Instant;

use crate::adapters::{ActivityBackend, AnalyticsBackend};
use crate::network::shutdown::ShutdownController;
use crate::service::{OperationMetrics, OperationPipeline};

pub use graphql::graphql_handler;
pub use health::{health_handler, liveness_handler, readiness_handler};

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The composed operation pipeline (router wrapped in middleware).
    pub pipeline: OperationPipeline,
    /// Per-operation counters snapshotted by the health surface.
    pub metrics: Arc<OperationMetrics>,
    /// Activity backend, probed directly by the health surface.
    pub activity: Arc<dyn ActivityBackend>,
    /// Analytics backend, probed directly by the health surface.
    pub analytics: Arc<dyn AnalyticsBackend>,
    pub shutdown: Arc<ShutdownController>,
    pub start_time: Instant,
}
