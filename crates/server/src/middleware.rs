//! CORS and request tracing for the inbound handshake endpoint.

use std::time::Duration;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Permissive CORS suitable for a browser client performing the WebSocket handshake.
/// There is no cookie-based auth on this endpoint, so credentials are never required.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any)
        .max_age(Duration::from_secs(3600))
}

pub fn trace_layer() -> TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}
