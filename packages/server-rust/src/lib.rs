//! `FitGate` Server — the aggregation gateway composing the activity-record
//! and analytics backends into one typed query surface, with retry, error
//! classification, and input validation at the seam.

pub mod adapters;
pub mod network;
pub mod service;

pub use adapters::{ActivityBackend, AdapterError, AnalyticsBackend, ProbeResult};
pub use network::{GatewayState, NetworkConfig, NetworkModule};
pub use service::{GatewayConfig, OperationPipeline, RetryPolicy};
