//! Raw byte forwarding to a configured upstream.
//!
//! The forward path streams bytes verbatim in both directions: no parsing,
//! no transformation, no buffering. Method, path, query, headers, and body
//! pass through unchanged apart from hop-by-hop headers and the optional
//! Host rewrite. When the downstream client disconnects, axum drops the
//! handler future and the in-flight reqwest call is cancelled with it.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use super::correlation::CORRELATION_HEADER;
use crate::routes::Route;

/// Headers that should NOT be forwarded (hop-by-hop headers).
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "transfer-encoding",
    "keep-alive",
    "upgrade",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
];

/// Build the upstream client for a route. Routes with `verify_tls = false`
/// accept self-signed certificates (loopback development targets only).
/// Redirects are returned to the caller verbatim, never followed.
pub fn build_client(route: &Route) -> anyhow::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(route.timeout_secs));

    if !route.verify_tls {
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder.build()?)
}

/// Forward a request to the route's upstream and stream the response back.
///
/// The upstream URL is the target origin with the original path and query
/// appended. Status code, headers, and body come back unmodified; failures
/// map to 502 (unreachable) or 504 (timeout) with a diagnostic body, never
/// a retry.
pub async fn forward(
    client: &reqwest::Client,
    route: &Route,
    method: Method,
    path_and_query: &str,
    headers: &HeaderMap,
    body: reqwest::Body,
    correlation_id: &str,
) -> Response {
    let base = route.target.as_str().trim_end_matches('/');
    let url = format!("{base}{path_and_query}");

    let host = route.target.host_str().unwrap_or("");
    let span = devgate_tracing::forward_span!(correlation_id, host);
    let start = Instant::now();

    async {
        let mut req_builder = client
            .request(method, &url)
            .body(body)
            .header(CORRELATION_HEADER, correlation_id);

        // Forward non-hop-by-hop headers from the original request
        for (name, value) in headers.iter() {
            let name_str = name.as_str().to_lowercase();
            if HOP_BY_HOP_HEADERS.contains(&name_str.as_str()) {
                continue;
            }
            if name_str == CORRELATION_HEADER {
                continue;
            }
            // Skip content-length — the streamed body is re-framed by the
            // upstream client
            if name_str == "content-length" {
                continue;
            }
            // With rewrite_origin, Host comes from the target URL instead
            if name_str == "host" && route.rewrite_origin {
                continue;
            }
            req_builder = req_builder.header(name, value);
        }

        let upstream_result = req_builder.send().await;

        build_response(upstream_result, start, correlation_id)
    }
    .instrument(span)
    .await
}

/// Build an axum Response from the upstream reqwest result, streaming the
/// body verbatim.
fn build_response(
    upstream_result: Result<reqwest::Response, reqwest::Error>,
    start: Instant,
    correlation_id: &str,
) -> Response {
    let upstream_resp = match upstream_result {
        Ok(resp) => resp,
        Err(e) => {
            let latency = start.elapsed().as_millis() as u64;
            tracing::Span::current().record("latency_ms", latency);

            if e.is_timeout() {
                tracing::Span::current().record("status", 504_u16);
                tracing::error!(error = %e, "Upstream timeout");
                return (
                    StatusCode::GATEWAY_TIMEOUT,
                    format!("devgate: upstream timed out: {e}"),
                )
                    .into_response();
            }
            tracing::Span::current().record("status", 502_u16);
            tracing::error!(error = %e, "Upstream connection error");
            return (
                StatusCode::BAD_GATEWAY,
                format!("devgate: upstream unreachable: {e}"),
            )
                .into_response();
        }
    };

    let status = upstream_resp.status();
    let latency = start.elapsed().as_millis() as u64;
    tracing::Span::current().record("latency_ms", latency);
    tracing::Span::current().record("status", status.as_u16());

    tracing::debug!(
        status = status.as_u16(),
        latency_ms = latency,
        "Forward complete"
    );

    let mut response_builder = Response::builder()
        .status(StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY));

    // Forward response headers from upstream
    for (name, value) in upstream_resp.headers().iter() {
        let name_str = name.as_str().to_lowercase();
        if HOP_BY_HOP_HEADERS.contains(&name_str.as_str()) {
            continue;
        }
        response_builder = response_builder.header(name, value);
    }

    response_builder = response_builder.header(
        CORRELATION_HEADER,
        HeaderValue::from_str(correlation_id)
            .unwrap_or_else(|_| HeaderValue::from_static("unknown")),
    );

    // Stream the body verbatim
    let body = Body::from_stream(upstream_resp.bytes_stream());

    response_builder.body(body).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build response");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
    })
}
