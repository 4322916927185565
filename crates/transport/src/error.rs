use thiserror::Error;

/// Failures specific to the outbound transport adapter itself, before they are folded
/// into a [`wsio_core::SessionError::Transport`] for the session to react to.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("failed to connect to {url}: {message}")]
    Connect { url: String, message: String },
    #[error("send failed: {0}")]
    Send(String),
}
