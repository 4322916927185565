//! Bidirectional, multiplexed RPC-over-WebSocket session layer.
//!
//! This crate is a thin facade over the workspace's member crates, re-exporting the
//! pieces an embedder needs without requiring a direct dependency on each one:
//! `wsio-wire`'s frame/packet codec, `wsio-core`'s session state machine, `wsio-transport`'s
//! outbound adapter, and `wsio-server`'s inbound acceptor.

pub use wsio_bus::{is_blacklisted, EventBus, Listener};
pub use wsio_core::{
    close_code_name, ChannelDelegate, HookFuture, HookHandler, HookResult, Role, RpcError,
    SessionConfig, SessionError, Socket, Transport, TransportEvent, TransportFactory,
    TransportSendError,
};
pub use wsio_server::{ChannelRegistry, ServerConfig, ServerError, WsioServer};
pub use wsio_transport::{
    transport_factory, BackoffConfig, HeartbeatConfig, TransportError, TungsteniteTransport,
    WebSocketTransportConfig,
};
pub use wsio_wire::{Frame, FrameData, FrameKind, HandshakePayload, Packet, PacketKind, WireError, WireMessage};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
