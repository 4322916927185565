use bytes::Bytes;

use crate::error::WireError;
use crate::frame::Frame;

/// Stateful decoder consumed by the session core. Over a native WebSocket transport each
/// inbound message maps to exactly one frame, so this parser does not need to buffer
/// partial frames across calls — but it is kept as a distinct type (rather than free
/// functions) so a future transport that packs multiple frames per message can grow this
/// without changing the session core's call sites.
#[derive(Debug, Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Parser
    }

    /// Feeds one textual WebSocket message, producing the single frame it encodes.
    pub fn feed_str(&mut self, text: &str) -> Result<Frame, WireError> {
        Frame::from_text(text)
    }

    /// Feeds one binary WebSocket message, producing the attachment frame it encodes.
    pub fn feed_bytes(&mut self, bytes: Bytes) -> Result<Frame, WireError> {
        Ok(Frame::from_binary(bytes))
    }
}
