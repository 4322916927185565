#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

//! Session state machine, RPC correlation, and liveness subsystem for the wsio protocol
//! core.
//!
//! This crate defines the [`Transport`] seam but never implements one: the outbound
//! `tokio-tungstenite` adapter lives in `wsio-transport` and the inbound `axum` acceptor
//! lives in `wsio-server`, both depending on this crate rather than the other way
//! around.

mod channel;
mod config;
mod error;
mod hook;
mod job;
mod lifecycle;
mod session;
mod transport;

pub use channel::ChannelDelegate;
pub use config::SessionConfig;
pub use error::SessionError;
pub use hook::{HookFuture, HookHandler, HookResult};
pub use job::RpcError;
pub use session::{close_code_name, Role, Socket, TransportFactory};
pub use transport::{Transport, TransportEvent, TransportSendError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
