use serde::{Deserialize, Serialize};

/// The canonical session id this crate always hands out on accept. Engine.IO servers
/// normally mint a unique sid per connection; this protocol core has no notion of
/// session resumption, so a constant placeholder is sufficient (and matches the
/// behaviour described in the OPEN handshake payload of the external interfaces).
pub const PLACEHOLDER_SID: &str = "00000000000000000000";

/// The JSON payload carried by the server's OPEN frame during the handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakePayload {
    pub sid: String,
    pub upgrades: Vec<String>,
    #[serde(rename = "pingInterval")]
    pub ping_interval: u32,
    #[serde(rename = "pingTimeout")]
    pub ping_timeout: u32,
}

impl HandshakePayload {
    pub fn new(ping_interval: u32, ping_timeout: u32) -> Self {
        HandshakePayload {
            sid: PLACEHOLDER_SID.to_string(),
            upgrades: Vec::new(),
            ping_interval,
            ping_timeout,
        }
    }
}
