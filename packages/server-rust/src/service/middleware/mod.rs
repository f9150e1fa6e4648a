//! Tower middleware for the operation pipeline.

pub mod metrics;
pub mod pipeline;

pub use metrics::{MetricsLayer, OperationCounters, OperationMetrics};
pub use pipeline::{build_operation_pipeline, OperationPipeline};
