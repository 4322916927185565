use bytes::Bytes;

use crate::error::WireError;

/// Outer transport-layer frame type (Engine.IO-style).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Open,
    Close,
    Ping,
    Pong,
    Message,
    Upgrade,
    Noop,
}

impl FrameKind {
    fn code(self) -> u8 {
        match self {
            FrameKind::Open => b'0',
            FrameKind::Close => b'1',
            FrameKind::Ping => b'2',
            FrameKind::Pong => b'3',
            FrameKind::Message => b'4',
            FrameKind::Upgrade => b'5',
            FrameKind::Noop => b'6',
        }
    }

    fn from_code(code: u8) -> Result<Self, WireError> {
        match code {
            b'0' => Ok(FrameKind::Open),
            b'1' => Ok(FrameKind::Close),
            b'2' => Ok(FrameKind::Ping),
            b'3' => Ok(FrameKind::Pong),
            b'4' => Ok(FrameKind::Message),
            b'5' => Ok(FrameKind::Upgrade),
            b'6' => Ok(FrameKind::Noop),
            other => Err(WireError::UnknownFrameType(other)),
        }
    }
}

/// Payload carried by a [`Frame`], in whichever form it arrived or will be sent.
#[derive(Debug, Clone)]
pub enum FrameData {
    Text(String),
    Binary(Bytes),
}

impl FrameData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FrameData::Text(s) => Some(s),
            FrameData::Binary(_) => None,
        }
    }
}

/// A wire-level message ready to hand to a transport's `send_text`/`send_binary`.
#[derive(Debug, Clone)]
pub enum WireMessage {
    Text(String),
    Binary(Bytes),
}

/// The outer envelope described in OVERVIEW/DATA MODEL: one of OPEN/CLOSE/PING/PONG/
/// MESSAGE/UPGRADE/NOOP, carrying either textual or binary data.
#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: FrameKind,
    pub data: FrameData,
    pub binary: bool,
}

impl Frame {
    pub fn open(handshake_json: String) -> Self {
        Frame {
            kind: FrameKind::Open,
            data: FrameData::Text(handshake_json),
            binary: false,
        }
    }

    pub fn close() -> Self {
        Frame {
            kind: FrameKind::Close,
            data: FrameData::Text(String::new()),
            binary: false,
        }
    }

    pub fn ping() -> Self {
        Frame {
            kind: FrameKind::Ping,
            data: FrameData::Text(String::new()),
            binary: false,
        }
    }

    pub fn pong() -> Self {
        Frame {
            kind: FrameKind::Pong,
            data: FrameData::Text(String::new()),
            binary: false,
        }
    }

    pub fn noop() -> Self {
        Frame {
            kind: FrameKind::Noop,
            data: FrameData::Text(String::new()),
            binary: false,
        }
    }

    pub fn message_text(packet_text: String) -> Self {
        Frame {
            kind: FrameKind::Message,
            data: FrameData::Text(packet_text),
            binary: false,
        }
    }

    pub fn message_binary(attachment: Bytes) -> Self {
        Frame {
            kind: FrameKind::Message,
            data: FrameData::Binary(attachment),
            binary: true,
        }
    }

    /// Decodes a frame received as a textual WebSocket message.
    pub fn from_text(text: &str) -> Result<Self, WireError> {
        let mut bytes = text.bytes();
        let code = bytes.next().ok_or(WireError::EmptyFrame)?;
        let kind = FrameKind::from_code(code)?;
        let rest = &text[1..];
        Ok(Frame {
            kind,
            data: FrameData::Text(rest.to_string()),
            binary: false,
        })
    }

    /// Decodes a frame received as a binary WebSocket message. Engine.IO carries binary
    /// attachments with no leading type byte — the WebSocket frame type already disambiguates
    /// it as a MESSAGE frame's attachment.
    pub fn from_binary(bytes: Bytes) -> Self {
        Frame {
            kind: FrameKind::Message,
            data: FrameData::Binary(bytes),
            binary: true,
        }
    }

    /// Serializes this frame as it should be transmitted over the transport.
    pub fn to_raw(&self) -> WireMessage {
        match &self.data {
            FrameData::Binary(bytes) => WireMessage::Binary(bytes.clone()),
            FrameData::Text(text) => {
                let mut out = String::with_capacity(text.len() + 1);
                out.push(self.kind.code() as char);
                out.push_str(text);
                WireMessage::Text(out)
            }
        }
    }

    pub fn to_string_lossy(&self) -> String {
        match self.to_raw() {
            WireMessage::Text(t) => t,
            WireMessage::Binary(_) => format!("{}<binary>", self.kind.code() as char),
        }
    }
}
