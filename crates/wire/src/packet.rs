use bytes::Bytes;
use serde_json::Value;

use crate::error::WireError;

/// Inner application-layer packet type, carried inside MESSAGE frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    Connect,
    Disconnect,
    Event,
    Ack,
    Error,
    BinaryEvent,
    BinaryAck,
}

impl PacketKind {
    fn digit(self) -> u8 {
        match self {
            PacketKind::Connect => b'0',
            PacketKind::Disconnect => b'1',
            PacketKind::Event => b'2',
            PacketKind::Ack => b'3',
            PacketKind::Error => b'4',
            PacketKind::BinaryEvent => b'5',
            PacketKind::BinaryAck => b'6',
        }
    }

    fn from_digit(digit: u8) -> Result<Self, WireError> {
        match digit {
            b'0' => Ok(PacketKind::Connect),
            b'1' => Ok(PacketKind::Disconnect),
            b'2' => Ok(PacketKind::Event),
            b'3' => Ok(PacketKind::Ack),
            b'4' => Ok(PacketKind::Error),
            b'5' => Ok(PacketKind::BinaryEvent),
            b'6' => Ok(PacketKind::BinaryAck),
            other => Err(WireError::UnknownPacketType(other)),
        }
    }

    pub fn carries_attachments(self) -> bool {
        matches!(self, PacketKind::BinaryEvent | PacketKind::BinaryAck)
    }

    pub fn is_event(self) -> bool {
        matches!(self, PacketKind::Event | PacketKind::BinaryEvent)
    }

    pub fn is_ack(self) -> bool {
        matches!(self, PacketKind::Ack | PacketKind::BinaryAck)
    }
}

/// The inner application-layer message, optionally correlated by `id` and optionally
/// carrying binary attachments that arrive as subsequent binary MESSAGE frames.
#[derive(Debug, Clone)]
pub struct Packet {
    pub kind: PacketKind,
    /// `None` corresponds to the spec's `id = -1` ("no correlation").
    pub id: Option<u32>,
    pub attachments: u32,
    pub buffers: Vec<Bytes>,
    payload: Value,
}

impl Packet {
    pub fn new(kind: PacketKind) -> Self {
        Packet {
            kind,
            id: None,
            attachments: 0,
            buffers: Vec::new(),
            payload: Value::Null,
        }
    }

    pub fn connect() -> Self {
        Packet::new(PacketKind::Connect)
    }

    pub fn disconnect() -> Self {
        Packet::new(PacketKind::Disconnect)
    }

    pub fn event(data: Value) -> Self {
        let mut p = Packet::new(PacketKind::Event);
        p.set_data(data);
        p
    }

    pub fn ack(id: u32, data: Value) -> Self {
        let mut p = Packet::new(PacketKind::Ack);
        p.id = Some(id);
        p.set_data(data);
        p
    }

    pub fn error(data: Value) -> Self {
        let mut p = Packet::new(PacketKind::Error);
        p.set_data(data);
        p
    }

    pub fn get_data(&self) -> &Value {
        &self.payload
    }

    pub fn set_data(&mut self, value: Value) {
        self.payload = value;
    }

    /// Decodes a packet from the textual payload of a MESSAGE frame.
    pub fn from_str(text: &str) -> Result<Self, WireError> {
        let mut chars = text.bytes().peekable();
        let digit = *chars.peek().ok_or(WireError::EmptyFrame)?;
        let kind = PacketKind::from_digit(digit)?;
        let mut rest = &text[1..];

        let mut attachments = 0u32;
        if kind.carries_attachments() {
            let sep = rest
                .find('-')
                .ok_or(WireError::MissingAttachmentSeparator)?;
            attachments = rest[..sep].parse().unwrap_or(0);
            rest = &rest[sep + 1..];
        }

        let digit_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let id = if digit_len > 0 {
            rest[..digit_len].parse::<u32>().ok()
        } else {
            None
        };
        rest = &rest[digit_len..];

        let payload = if rest.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(rest)?
        };

        Ok(Packet {
            kind,
            id,
            attachments,
            buffers: Vec::new(),
            payload,
        })
    }

    /// Serializes this packet's textual header+payload (attachments are sent separately as
    /// raw binary MESSAGE frames by the caller, in `buffers` order).
    pub fn to_string_wire(&self) -> String {
        let mut out = String::new();
        out.push(self.kind.digit() as char);
        if self.kind.carries_attachments() {
            out.push_str(&self.attachments.to_string());
            out.push('-');
        }
        if let Some(id) = self.id {
            out.push_str(&id.to_string());
        }
        if !self.payload.is_null() {
            out.push_str(&self.payload.to_string());
        }
        out
    }
}
