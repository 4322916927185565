//! Inbound Axum WebSocket acceptor for the wsio session layer.
//!
//! Accepts the `/socket.io/?transport=websocket` handshake, spawns one `wsio_core::Socket`
//! per connection, and tracks accepted sessions plus their channel memberships so the
//! channel delegate (`join`/`leave`/`channel`) has somewhere to live.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use dashmap::DashMap;
use tokio::net::TcpListener;
use tracing::info;
use wsio_core::Socket;

pub mod acceptor;
pub mod config;
pub mod error;
pub mod middleware;
pub mod registry;

pub use config::ServerConfig;
pub use error::ServerError;
pub use registry::ChannelRegistry;

/// State shared across every accepted connection: the channel-membership registry and a
/// live table of accepted sessions, both cheap to clone since they're `Arc`-backed.
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ServerConfig>,
    pub channels: Arc<ChannelRegistry>,
    pub sessions: Arc<DashMap<String, Socket>>,
}

/// Runs the inbound wsio server: binds `config.bind_address`, serves `/socket.io/`, and
/// blocks until the listener stops (normally until the process is signalled to shut down
/// by the caller).
pub struct WsioServer {
    router: Router,
    config: Arc<ServerConfig>,
}

impl WsioServer {
    pub fn new(config: ServerConfig) -> Self {
        let config = Arc::new(config);
        let state = ServerState {
            config: config.clone(),
            channels: Arc::new(ChannelRegistry::new()),
            sessions: Arc::new(DashMap::new()),
        };

        let router = Router::new()
            .route("/socket.io/", get(acceptor::handshake))
            .layer(middleware::trace_layer())
            .layer(middleware::cors_layer())
            .with_state(state);

        Self { router, config }
    }

    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.config.bind_address)
            .await
            .map_err(|source| ServerError::Bind { address: self.config.bind_address.clone(), source })?;

        info!(address = %self.config.bind_address, "wsio server listening");
        axum::serve(listener, self.router)
            .await
            .map_err(|error| ServerError::Bind {
                address: self.config.bind_address.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, error.to_string()),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn rejects_handshake_without_websocket_transport() {
        let server = WsioServer::new(ServerConfig::default());
        let response = server
            .router
            .oneshot(Request::builder().uri("/socket.io/?transport=polling").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
