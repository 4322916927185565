use dashmap::{DashMap, DashSet};
use wsio_core::ChannelDelegate;

/// In-memory channel-membership registry shared by every inbound session accepted on
/// this server. Keyed by channel name rather than session id, since `contains` and
/// broadcast-style fan-out (not yet exposed, but the natural next consumer) both want to
/// start from "who is in this channel".
#[derive(Default)]
pub struct ChannelRegistry {
    channels: DashMap<String, DashSet<String>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes `session_id` from every channel it had joined. Called once a session is
    /// destroyed so membership doesn't leak past the connection's lifetime.
    pub fn drop_session(&self, session_id: &str) {
        for entry in self.channels.iter() {
            entry.value().remove(session_id);
        }
        self.channels.retain(|_, members| !members.is_empty());
    }

    /// Session ids currently in `channel`.
    pub fn members(&self, channel: &str) -> Vec<String> {
        self.channels
            .get(channel)
            .map(|members| members.iter().map(|id| id.clone()).collect())
            .unwrap_or_default()
    }
}

impl ChannelDelegate for ChannelRegistry {
    fn join(&self, session_id: &str, channel: &str) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .insert(session_id.to_string());
    }

    fn leave(&self, session_id: &str, channel: &str) {
        if let Some(members) = self.channels.get(channel) {
            members.remove(session_id);
        }
    }

    fn contains(&self, session_id: &str, channel: &str) -> bool {
        self.channels
            .get(channel)
            .map(|members| members.contains(session_id))
            .unwrap_or(false)
    }
}
