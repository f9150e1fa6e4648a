//! Health, liveness, and readiness endpoint handlers.
//!
//! The composed health check probes every downstream adapter concurrently —
//! without retry, so the report reflects the current state — and aggregates
//! the results with the gateway's own lifecycle state.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Map, Value};

use super::AppState;
use crate::adapters::ProbeResult;
use crate::network::shutdown::HealthState;

fn render_probe(probe: &ProbeResult) -> Value {
    match &probe.detail {
        Some(detail) if !probe.connected => json!({
            "status": "disconnected",
            "error": detail,
        }),
        _ => json!({ "status": if probe.connected { "connected" } else { "disconnected" } }),
    }
}

/// Returns the composed health report as JSON.
///
/// Always returns 200 — the `status` field carries the verdict. `healthy`
/// requires every downstream probe to connect; any failure degrades the
/// whole surface while the per-service section pinpoints the culprit.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let (activity, analytics) = tokio::join!(state.activity.probe(), state.analytics.probe());
    let all_connected = activity.connected && analytics.connected;

    let mut operations = Map::new();
    for (name, counters) in state.metrics.snapshot() {
        operations.insert(
            name,
            json!({ "calls": counters.calls, "failures": counters.failures }),
        );
    }

    Json(json!({
        "status": if all_connected { "healthy" } else { "degraded" },
        "state": state.shutdown.health_state().as_str(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "in_flight": state.shutdown.in_flight_count(),
        "services": {
            "activity": render_probe(&activity),
            "analytics": render_probe(&analytics),
        },
        "operations": operations,
    }))
}

/// Liveness probe — always returns 200 OK.
///
/// Only checks that the process is running and responsive. Downstream
/// health is deliberately excluded: a failed liveness probe triggers a
/// restart, and restarting the gateway does not fix a broken backend.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe — 200 when ready, 503 otherwise.
///
/// Returns 503 during startup (before `set_ready()`), while draining, and
/// after stop, removing the gateway from the load balancer's rotation.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.shutdown.health_state() == HealthState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
