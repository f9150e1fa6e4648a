//! FitGate server binary.
//!
//! Composes the gateway schema, wires the downstream adapters and resolver
//! pipeline, and serves the HTTP surface until SIGTERM/ctrl-c. Startup
//! aborts if schema composition detects a root-namespace collision.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use fitgate_core::ComposedSchema;
use fitgate_server::adapters::{
    ActivityAdapter, ActivityAdapterConfig, AnalyticsAdapter, AnalyticsAdapterConfig,
};
use fitgate_server::network::{GatewayState, NetworkConfig, NetworkModule, TlsConfig};
use fitgate_server::service::{
    build_operation_pipeline, ActivityResolvers, AnalyticsResolvers, GatewayConfig,
    OperationMetrics, OperationRouter, RetryPolicy, Sleeper, TokioSleeper,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fitgate", about = "Aggregation gateway for the fitness tracker")]
struct Args {
    /// Bind address.
    #[arg(long, env = "FITGATE_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, env = "FITGATE_PORT", default_value_t = 4000)]
    port: u16,

    /// Base URL of the activity-record service.
    #[arg(long, env = "ACTIVITY_URL", default_value = "http://activity-tracking:5300")]
    activity_url: String,

    /// Base URL of the analytics service.
    #[arg(long, env = "ANALYTICS_URL", default_value = "http://analytics:5050")]
    analytics_url: String,

    /// Total downstream attempts per operation, including the first.
    #[arg(long, env = "FITGATE_MAX_ATTEMPTS", default_value_t = 2)]
    max_attempts: u32,

    /// Base backoff delay in milliseconds; attempt n waits n times this.
    #[arg(long, env = "FITGATE_RETRY_BASE_MS", default_value_t = 1000)]
    retry_base_ms: u64,

    /// Allowed CORS origins, comma separated. `*` allows any.
    #[arg(long, env = "FITGATE_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    cors_origins: Vec<String>,

    /// TLS certificate path. TLS is enabled when both paths are set.
    #[arg(long, env = "FITGATE_TLS_CERT", requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// TLS private key path.
    #[arg(long, env = "FITGATE_TLS_KEY", requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    /// Prometheus exporter listen address (disabled when unset).
    #[arg(long, env = "FITGATE_METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,

    /// Emit logs as JSON.
    #[arg(long, env = "FITGATE_LOG_JSON", default_value_t = false)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolves on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    if let Some(addr) = args.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to start Prometheus exporter")?;
        info!(%addr, "Prometheus exporter listening");
    }

    let gateway_config = GatewayConfig {
        activity: ActivityAdapterConfig {
            base_url: args.activity_url,
            ..ActivityAdapterConfig::default()
        },
        analytics: AnalyticsAdapterConfig {
            base_url: args.analytics_url,
            ..AnalyticsAdapterConfig::default()
        },
        retry: RetryPolicy {
            max_attempts: args.max_attempts,
            base_delay: Duration::from_millis(args.retry_base_ms),
        },
    };

    let client = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;

    let activity = Arc::new(ActivityAdapter::new(
        client.clone(),
        gateway_config.activity.clone(),
    ));
    let analytics = Arc::new(AnalyticsAdapter::new(
        client,
        gateway_config.analytics.clone(),
    ));

    // Composition fails fast: a duplicate root operation aborts startup.
    let schema = Arc::new(
        ComposedSchema::compose(vec![
            ActivityResolvers::fragment(),
            AnalyticsResolvers::fragment(),
        ])
        .context("schema composition failed")?,
    );
    info!(operations = schema.len(), "composed gateway schema");

    let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
    let mut router = OperationRouter::new(Arc::clone(&schema));
    router.register(
        ActivityResolvers::DOMAIN,
        ActivityResolvers::new(activity.clone(), gateway_config.retry, Arc::clone(&sleeper)),
    );
    router.register(
        AnalyticsResolvers::DOMAIN,
        AnalyticsResolvers::new(analytics.clone(), gateway_config.retry, sleeper),
    );

    let metrics = Arc::new(OperationMetrics::default());
    let pipeline = build_operation_pipeline(router, Arc::clone(&metrics));

    let tls = match (args.tls_cert, args.tls_key) {
        (Some(cert_path), Some(key_path)) => Some(TlsConfig {
            cert_path,
            key_path,
        }),
        _ => None,
    };

    let network_config = NetworkConfig {
        host: args.host,
        port: args.port,
        tls,
        cors_origins: args.cors_origins,
        ..NetworkConfig::default()
    };

    let mut module = NetworkModule::new(
        network_config,
        GatewayState {
            pipeline,
            metrics,
            activity,
            analytics,
        },
    );

    let port = module.start().await.context("failed to bind listener")?;
    info!(port, "fitgate listening");

    module.serve(shutdown_signal()).await
}
