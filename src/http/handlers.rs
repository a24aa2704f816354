//! HTTP endpoint handlers for the allow-list API
//!
//! `/ali/add` reads the bounded body, validates it and hands the result to
//! the firewall service. The root greeting and metrics handlers live here too.

use axum::{
    body::{to_bytes, Bytes},
    extract::{ConnectInfo, Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn, Instrument};

use crate::{
    config::SystemConfig,
    firewall::{AllowOutcome, FirewallService},
    http::{responses::RequestError, validator::validate_add_request},
    logging, metrics,
};

/// Application state shared across all handlers
pub struct AppState {
    pub config: SystemConfig,
    pub service: FirewallService,
}

/// /ali/add - Allow-list the caller's (or the given) public IP
///
/// Routed for every method so that the validator answers 405 itself.
pub async fn handle_add(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let result = process_add(&state, request, remote_addr).await;

    match result {
        Ok(outcome) => {
            metrics::record_allow_outcome(outcome.label());
            (StatusCode::OK, outcome.message()).into_response()
        }
        Err(e) => {
            metrics::record_allow_outcome(e.label());
            match &e {
                RequestError::Provider(_) => warn!(error = %e, "Allow-list request failed"),
                _ => info!(
                    status = e.status_code().as_u16(),
                    reason = %e,
                    "Allow-list request rejected"
                ),
            }
            e.into_response()
        }
    }
}

async fn process_add(
    state: &AppState,
    request: Request,
    remote_addr: Option<SocketAddr>,
) -> Result<AllowOutcome, RequestError> {
    let (parts, body) = request.into_parts();

    let body = if parts.method == Method::POST {
        to_bytes(body, state.config.max_request_bytes())
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to read request body");
                RequestError::UnreadableBody
            })?
    } else {
        Bytes::new()
    };

    let allow_request = validate_add_request(
        &parts.method,
        &body,
        &parts.headers,
        remote_addr,
        state.config.security.token.expose(),
    )?;

    let span = logging::request_span(
        allow_request.kind.as_str(),
        &allow_request.region,
        &allow_request.instance,
    );

    let outcome = state
        .service
        .allow(&allow_request)
        .instrument(span)
        .await?;

    Ok(outcome)
}

/// / - Static greeting, also answers any unknown path
pub async fn handle_root() -> &'static str {
    "Hello World!"
}

/// GET /metrics - Prometheus metrics endpoint
pub async fn handle_metrics() -> Result<impl IntoResponse, StatusCode> {
    match metrics::gather_metrics() {
        Ok(metrics_text) => Ok((
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            metrics_text,
        )),
        Err(e) => {
            warn!(error = %e, "Failed to gather Prometheus metrics");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
