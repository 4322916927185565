use thiserror::Error;

/// Failures specific to standing up or accepting connections on the inbound server,
/// before a session itself exists to report its own `SessionError`s.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind to {address}: {source}")]
    Bind { address: String, source: std::io::Error },

    #[error("websocket upgrade rejected: {0}")]
    Upgrade(String),
}
