//! Gateway-level configuration for dispatch and resilience.

use crate::adapters::{ActivityAdapterConfig, AnalyticsAdapterConfig};
use crate::service::retry::RetryPolicy;

/// Configuration for the gateway core: downstream endpoints and the retry
/// schedule applied uniformly around adapter calls.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Activity-record service connection settings.
    pub activity: ActivityAdapterConfig,
    /// Analytics service connection settings.
    pub analytics: AnalyticsAdapterConfig,
    /// Retry schedule for downstream calls. Health probes bypass it.
    pub retry: RetryPolicy,
}
