use thiserror::Error;

/// Errors surfaced while decoding or encoding frames and packets.
#[derive(Error, Debug)]
pub enum WireError {
    /// The leading type byte did not match any known frame type.
    #[error("unknown frame type byte: {0:#x}")]
    UnknownFrameType(u8),
    /// The leading type byte did not match any known packet type.
    #[error("unknown packet type byte: {0:#x}")]
    UnknownPacketType(u8),
    /// A textual frame/packet was empty where a type byte was required.
    #[error("empty frame payload")]
    EmptyFrame,
    /// A binary message frame arrived where a textual one was required (or vice versa).
    #[error("frame must be textual: {0}")]
    NotTextual(&'static str),
    /// Payload bytes were not valid UTF-8.
    #[error("invalid utf-8 in frame payload: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// The JSON payload of a packet or OPEN frame failed to parse.
    #[error("invalid json payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// A `BINARY_EVENT`/`BINARY_ACK` packet header was missing its `N-` attachment-count prefix.
    #[error("missing attachment count separator in binary packet header")]
    MissingAttachmentSeparator,
    /// The OPEN handshake payload was missing or had the wrong type for `pingInterval`/`pingTimeout`.
    #[error("handshake payload missing required field: {0}")]
    MissingHandshakeField(&'static str),
}
