//! HTTP server setup and configuration
//!
//! This module provides the main server startup logic, routing configuration,
//! and graceful shutdown handling for the allow-list endpoint.

use axum::{
    http::StatusCode,
    routing::{any, get},
    Router,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, info_span, instrument};

use crate::{
    config::SystemConfig,
    firewall::{FirewallProvider, FirewallService},
    http::handlers::*,
    types::Result,
};

/// Start the HTTP server with the given configuration
#[instrument(skip_all)]
pub async fn start_server(
    system_config: SystemConfig,
    provider: Arc<dyn FirewallProvider>,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = system_config.listen_address()?;

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        error!(
            error = %e,
            addr = %addr,
            "Failed to bind to address"
        );
        crate::types::Error::Io(e)
    })?;

    serve(listener, system_config, provider, shutdown_signal).await
}

/// Serve on an already bound listener until the shutdown signal fires
pub async fn serve(
    listener: TcpListener,
    system_config: SystemConfig,
    provider: Arc<dyn FirewallProvider>,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let service = FirewallService::new(provider, system_config.ali.page_size);
    info!(provider = service.provider_name(), "Firewall provider initialized");

    let app_state = Arc::new(AppState {
        config: system_config.clone(),
        service,
    });

    let router = create_router(app_state, &system_config);

    info!(
        local_addr = %listener.local_addr().map_err(crate::types::Error::Io)?,
        max_request_size = %system_config.server.max_request_size,
        request_timeout = system_config.server.request_timeout,
        metrics_enabled = system_config.monitoring.metrics_enabled,
        "HTTP server listening"
    );

    // Peer addresses are needed for the client IP fallback
    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        shutdown_signal.await;
        info!("Shutdown signal received, starting graceful shutdown");
    });

    if let Err(e) = server.await {
        error!(error = %e, "HTTP server error");
        return Err(crate::types::Error::Io(e));
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Create the Axum router with all endpoints and middleware
fn create_router(app_state: Arc<AppState>, config: &SystemConfig) -> Router {
    let router = Router::new()
        .route("/ali/add", any(handle_add))
        .route("/", any(handle_root));

    let router = if config.monitoring.metrics_enabled {
        router.route(&config.monitoring.metrics_path, get(handle_metrics))
    } else {
        router
    };

    router
        .fallback(handle_root)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
                let header = |name: &str| {
                    request
                        .headers()
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string()
                };
                info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    user_agent = %header("user-agent"),
                    request_id = %header("x-request-id"),
                )
            }),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout),
        ))
        .layer(RequestBodyLimitLayer::new(config.max_request_bytes()))
        .with_state(app_state)
}
