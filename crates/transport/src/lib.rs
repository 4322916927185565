#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

//! Outbound `tokio-tungstenite` transport adapter implementing `wsio-core`'s `Transport`
//! seam, with reconnect backoff and an optional protocol-level heartbeat.

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{
    connect, BackoffConfig, HeartbeatConfig, TungsteniteTransport, WebSocketTransportConfig,
};

use futures_util::future::BoxFuture;
use std::sync::Arc;
use wsio_core::TransportFactory;

/// Wraps [`connect`] as a [`TransportFactory`] for [`wsio_core::Socket::connect`],
/// dialing `config.url` fresh on every invocation (including the session's
/// connect-timeout-triggered reattach).
pub fn transport_factory(config: WebSocketTransportConfig) -> TransportFactory {
    Arc::new(move || -> BoxFuture<'static, _> {
        let config = config.clone();
        Box::pin(connect(config))
    })
}
