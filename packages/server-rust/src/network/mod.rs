//! HTTP surface: configuration, transport middleware, handlers, and
//! graceful shutdown control.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod module;
pub mod shutdown;

pub use config::{NetworkConfig, TlsConfig};
pub use handlers::AppState;
pub use module::{GatewayState, NetworkModule};
pub use shutdown::{HealthState, InFlightGuard, ShutdownController};
