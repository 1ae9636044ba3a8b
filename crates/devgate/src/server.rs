//! Axum HTTP server: router, listener, graceful shutdown.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::Instrument;

use crate::proxy::{correlation, forward};
use crate::routes::RouteTable;

/// Shared application state. The route table and clients are read-only
/// after startup, so handlers share them without synchronization.
pub struct AppState {
    pub table: RouteTable,
    /// Upstream clients, one per route, in table order.
    pub clients: Vec<reqwest::Client>,
    pub static_files: ServeDir,
}

impl AppState {
    /// Build per-route upstream clients from the validated table.
    pub fn new(table: RouteTable, static_dir: &str) -> anyhow::Result<Self> {
        let clients = table
            .routes()
            .iter()
            .map(forward::build_client)
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            table,
            clients,
            static_files: ServeDir::new(static_dir),
        })
    }
}

/// Build and run the HTTP server.
pub async fn run(state: AppState, listen_addr: &str) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(address = %listen_addr, "devgate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("devgate shut down gracefully");
    Ok(())
}

/// Assemble the axum router. Split out from [`run`] so tests can drive the
/// app on an ephemeral listener.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .fallback(handle_request)
        .with_state(Arc::new(state))
}

/// Catch-all handler: consult the route table, forward on a match, fall
/// through to the static file service otherwise.
///
/// The request body is never buffered: it is handed to the upstream client
/// as a stream, so bodies of any size pass through.
async fn handle_request(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let path = request.uri().path().to_string();

    let Some((idx, route)) = state.table.match_path(&path) else {
        return serve_static(&state, request).await;
    };

    let correlation_id = correlation::generate_id();
    let span = devgate_tracing::proxy_request_span!(&correlation_id, &path);

    let method = request.method().clone();
    let query = request
        .uri()
        .query()
        .map(|q| format!("?{q}"))
        .unwrap_or_default();
    let path_and_query = format!("{path}{query}");
    let headers = request.headers().clone();
    let body = reqwest::Body::wrap_stream(request.into_body().into_data_stream());

    async {
        let start = Instant::now();

        let response = forward::forward(
            &state.clients[idx],
            route,
            method,
            &path_and_query,
            &headers,
            body,
            &correlation_id,
        )
        .await;

        let span = tracing::Span::current();
        span.record("status", response.status().as_u16());
        span.record("latency_ms", start.elapsed().as_millis() as u64);

        response
    }
    .instrument(span)
    .await
}

/// Serve a request from the static build output directory.
async fn serve_static(state: &AppState, request: Request) -> Response {
    match state.static_files.clone().oneshot(request).await {
        Ok(resp) => resp.into_response(),
        Err(infallible) => match infallible {},
    }
}

/// Health check endpoint.
async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Wait for SIGINT (Ctrl+C) for graceful shutdown.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, draining connections...");
}
