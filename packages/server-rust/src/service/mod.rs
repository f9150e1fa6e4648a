//! Operation resolution and resilience framework.
//!
//! This module implements the gateway's dispatch pipeline:
//!
//! 1. **Operation types** (`operation`): the per-call envelope and errors
//! 2. **Retry** (`retry`): linear-backoff policy with an injected sleeper
//! 3. **Classification** (`classify`): raw failures -> caller-safe vocabulary
//! 4. **Routing** (`router`): composed-schema dispatch to domain resolvers
//! 5. **Resolvers** (`resolvers`): validate -> retry -> adapter -> reshape
//! 6. **Middleware** (`middleware`): Tower layers (metrics) around the router

pub mod classify;
pub mod config;
pub mod middleware;
pub mod operation;
pub mod resolvers;
pub mod retry;
pub mod router;

// Re-export key types for convenient access.
pub use classify::ErrorClassifier;
pub use config::GatewayConfig;
pub use middleware::{build_operation_pipeline, OperationMetrics, OperationPipeline};
pub use operation::{Operation, OperationError, OperationResponse};
pub use resolvers::{ActivityResolvers, AnalyticsResolvers};
pub use retry::{RecordingSleeper, RetryPolicy, Sleeper, TokioSleeper};
pub use router::OperationRouter;
