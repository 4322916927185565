#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

//! Frame and packet wire codec for the wsio session layer.
//!
//! This crate is deliberately small and free of any async runtime dependency: it only
//! encodes and decodes the two framing layers borrowed from the Engine.IO/Socket.IO wire
//! format. `wsio-core` depends on the types here but never on a concrete transport.

mod error;
mod frame;
mod handshake;
mod packet;
mod parser;

pub use error::WireError;
pub use frame::{Frame, FrameData, FrameKind, WireMessage};
pub use handshake::{HandshakePayload, PLACEHOLDER_SID};
pub use packet::{Packet, PacketKind};
pub use parser::Parser;
