use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::job::RpcError;

/// The result a registered RPC responder returns: `Ok(value)` becomes the ACK payload,
/// `Err(error)` becomes the ACK's error entry.
pub type HookResult = Result<Value, RpcError>;

/// The boxed future a [`HookHandler`] returns; named so callers can annotate a closure's
/// return type and get the right unsized coercion from `Box::pin(async move { .. })`.
pub type HookFuture = BoxFuture<'static, HookResult>;

/// A server-side RPC responder bound to one event name via [`crate::Socket::hook`].
pub type HookHandler = Arc<dyn Fn(Vec<Value>) -> HookFuture + Send + Sync>;
