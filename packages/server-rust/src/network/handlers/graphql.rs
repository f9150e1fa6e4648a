//! The unified query endpoint.
//!
//! `POST /graphql` accepts a typed request naming one operation with a JSON
//! argument object and answers `{ data } | { data, errors }`. The per-call
//! request context is built here from forwarded headers and threaded through
//! the pipeline; the gateway always answers 200 — failures are expressed in
//! the response body, not the transport status.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Json;
use fitgate_core::{ClassifiedError, GatewayRequest, GatewayResponse, RequestContext};
use tower::ServiceExt;
use uuid::Uuid;

use super::AppState;
use crate::service::Operation;

/// Builds the immutable per-call context from forwarded headers.
///
/// The `x-request-id` assigned by the transport middleware is reused when
/// present so gateway and downstream logs correlate.
fn context_from_headers(headers: &HeaderMap) -> RequestContext {
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string);

    let mut ctx = RequestContext::new(request_id);
    if let Some(credential) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        ctx = ctx.with_authorization(credential);
    }
    if let Some(screen) = headers.get("x-screen").and_then(|v| v.to_str().ok()) {
        ctx = ctx.with_screen(screen);
    }
    ctx
}

/// Handles one typed query/mutation document.
pub async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<GatewayRequest>, JsonRejection>,
) -> Json<GatewayResponse> {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return Json(GatewayResponse::failure(ClassifiedError::invalid(format!(
                "malformed request body: {rejection}"
            ))));
        }
    };

    let _guard = state.shutdown.begin_request();
    let ctx = context_from_headers(&headers);
    let operation_name = request.operation.clone();
    let op = Operation::new(request.operation, request.args, ctx);

    match state.pipeline.clone().oneshot(op).await {
        Ok(resp) => Json(GatewayResponse::success(&operation_name, resp.into_value())),
        Err(err) => Json(GatewayResponse::failure(err.to_classified())),
    }
}
