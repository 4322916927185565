use thiserror::Error;
use wsio_wire::WireError;

use crate::job::RpcError;

/// Errors surfaced by a session, either returned synchronously from an API call or
/// emitted on the session's `error` channel.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Invalid argument, duplicate hook binding, job-id collision, or a call made twice
    /// where the API forbids it. Fails fast; never recoverable at the call site.
    #[error("programmer error: {0}")]
    Programmer(String),

    /// A protocol violation observed while dispatching a frame or packet.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A remote RPC call failed, or the peer sent an uncorrelated ERROR packet.
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    /// The transport reported a send failure or an abnormal close.
    #[error("transport error: {0}")]
    Transport(String),

    /// A frame or packet failed to decode.
    #[error(transparent)]
    Wire(#[from] WireError),
}
