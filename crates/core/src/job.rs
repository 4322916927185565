use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// The `{message, code, type}` shape an RPC failure takes on the wire, coerced on
/// receipt: a non-string `message` becomes `"No message."`, a `code` that is neither a
/// number nor a string becomes `None`, and a non-string `type` becomes `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub message: String,
    pub code: Option<Value>,
    pub r#type: Option<String>,
}

impl RpcError {
    pub fn new(message: impl Into<String>) -> Self {
        RpcError {
            message: message.into(),
            code: None,
            r#type: None,
        }
    }

    /// Builds an `RpcError` from whatever the peer sent as an error payload, applying the
    /// wire-level coercions described in the external interfaces.
    pub fn from_wire(value: &Value) -> Self {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| "No message.".to_string());
        let code = value.get("code").and_then(|c| match c {
            Value::Number(_) | Value::String(_) => Some(c.clone()),
            _ => None,
        });
        let r#type = value
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string);
        RpcError {
            message,
            code,
            r#type,
        }
    }

    /// Renders this error as the `{message, code, type}` object carried on the wire.
    pub fn to_wire(&self) -> Value {
        serde_json::json!({
            "message": self.message,
            "code": self.code.clone().unwrap_or(Value::Null),
            "type": self.r#type,
        })
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RpcError {}

/// A pending outgoing call, resolved by a matching ACK or rejected by the liveness timer
/// once it has been outstanding longer than the configured job timeout.
pub(crate) struct Job {
    pub resolve: oneshot::Sender<Result<Value, RpcError>>,
    pub issued_at: Instant,
}
