use async_trait::async_trait;
use bytes::Bytes;
use wsio_wire::WireMessage;

/// A raw duplex WebSocket endpoint, consumed by the session actor. Implementors own the
/// actual socket; the session only ever calls `send_text`/`send_binary`/`close` and
/// receives [`TransportEvent`]s through a separate channel handed to
/// [`crate::Socket::accept`]/[`crate::Socket::connect`] at construction time.
#[async_trait]
pub trait Transport: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportSendError>;
    async fn send_binary(&mut self, bytes: Bytes) -> Result<(), TransportSendError>;
    async fn close(&mut self);
}

/// A transport-level send failure. Carries only a message: the session reacts to it
/// uniformly (surface as an error, then close/destroy per role) regardless of cause.
#[derive(Debug, Clone)]
pub struct TransportSendError(pub String);

impl std::fmt::Display for TransportSendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TransportSendError {}

/// Events a transport pushes into the session's mailbox as they occur. This is the
/// async-Rust rendering of the duplex-object-with-callbacks interface: `Open` fires once
/// the socket is established, `Message` carries one decoded wire message per inbound
/// frame, and `Error`/`Close` report terminal conditions.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Open,
    Message(WireMessage),
    Error(String),
    Close { code: u16, reason: String },
}
