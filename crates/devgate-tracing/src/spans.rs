//! Span builder helpers for devgate instrumentation.

/// Create a tracing span for the top-level proxied request.
///
/// Usage: `let _span = proxy_request_span!(correlation_id, path).entered();`
///
/// Fields recorded by the request handler when the forward completes:
/// - `status`: status code returned to the caller
/// - `latency_ms`: milliseconds from request receipt to response headers
#[macro_export]
macro_rules! proxy_request_span {
    ($correlation_id:expr, $path:expr) => {
        tracing::info_span!(
            "proxy_request",
            correlation_id = %$correlation_id,
            path = %$path,
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    };
}

/// Create a tracing span for a single upstream forward.
#[macro_export]
macro_rules! forward_span {
    ($correlation_id:expr, $target:expr) => {
        tracing::info_span!(
            "upstream_forward",
            correlation_id = %$correlation_id,
            target = %$target,
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    };
}
