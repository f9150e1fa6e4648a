//! Network module with deferred startup lifecycle.
//!
//! Implements the deferred startup pattern: `new()` creates resources,
//! `start()` binds the TCP listener, and `serve()` starts accepting
//! requests. This separation lets the binary compose the schema and wire
//! resolvers between construction and serving, and lets tests bind port 0.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    graphql_handler, health_handler, liveness_handler, readiness_handler, AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;
use crate::adapters::{ActivityBackend, AnalyticsBackend};
use crate::service::{OperationMetrics, OperationPipeline};

/// The application half of the handler state: everything the gateway wires
/// up before the network layer exists.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: OperationPipeline,
    pub metrics: Arc<OperationMetrics>,
    pub activity: Arc<dyn ActivityBackend>,
    pub analytics: Arc<dyn AnalyticsBackend>,
}

/// Manages the HTTP server lifecycle.
///
/// Follows the deferred startup pattern:
/// 1. `new()` — allocates shared state (shutdown controller)
/// 2. `start()` — binds the TCP listener to the configured address
/// 3. `serve()` — accepts requests until shutdown is signalled
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
    app: GatewayState,
}

impl NetworkModule {
    /// Creates a network module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, app: GatewayState) -> Self {
        Self {
            config,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
            app,
        }
    }

    /// Shared handle to the shutdown controller, for signal wiring.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    fn make_state(&self) -> AppState {
        AppState {
            pipeline: self.app.pipeline.clone(),
            metrics: Arc::clone(&self.app.metrics),
            activity: Arc::clone(&self.app.activity),
            analytics: Arc::clone(&self.app.analytics),
            shutdown: Arc::clone(&self.shutdown),
            start_time: Instant::now(),
        }
    }

    /// Assembles the axum router with all routes and transport middleware.
    ///
    /// Routes:
    /// - `POST /graphql` — the unified typed query endpoint
    /// - `GET /health` — composed downstream health report
    /// - `GET /health/live` — liveness probe
    /// - `GET /health/ready` — readiness probe
    #[must_use]
    pub fn build_router(&self) -> Router {
        let layers = build_http_layers(&self.config);

        Router::new()
            .route("/graphql", post(graphql_handler))
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .layer(layers)
            .with_state(self.make_state())
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until the shutdown signal fires, then drains.
    ///
    /// Consumes `self` because the listener is moved into the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a fatal I/O error.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called before `serve()`.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        // Destructure before building the router to avoid partial moves.
        let Self {
            config,
            listener,
            shutdown: shutdown_ctrl,
            app,
        } = self;
        let listener = listener.expect("start() must be called before serve()");

        let layers = build_http_layers(&config);
        let router = Router::new()
            .route("/graphql", post(graphql_handler))
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .layer(layers)
            .with_state(AppState {
                pipeline: app.pipeline,
                metrics: app.metrics,
                activity: app.activity,
                analytics: app.analytics,
                shutdown: Arc::clone(&shutdown_ctrl),
                start_time: Instant::now(),
            });

        let drain_timeout = config.drain_timeout;

        // Transition to Ready so readiness probes pass.
        shutdown_ctrl.set_ready();

        if let Some(tls) = config.tls {
            serve_tls(listener, router, &tls, shutdown).await?;
        } else {
            info!("Serving plain HTTP connections");
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await?;
        }

        // Drain in-flight requests before reporting Stopped.
        shutdown_ctrl.trigger_shutdown();
        if shutdown_ctrl.wait_for_drain(drain_timeout).await {
            info!("All in-flight requests drained");
        } else {
            warn!("Drain timeout expired with in-flight requests remaining");
        }
        Ok(())
    }
}

/// Serves TLS connections using `axum-server` with rustls.
///
/// Reuses the pre-bound TCP listener by converting it to a
/// `std::net::TcpListener`.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls: &super::config::TlsConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load TLS certificates: {e}"))?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        shutdown.await;
        shutdown_handle.graceful_shutdown(None);
    });

    info!("Serving TLS connections on {}", addr);

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}
