/// Delegate for channel membership, owned by the external server and consulted by
/// inbound sessions' `join`/`leave`/`channel` calls. Outbound sessions never hold one:
/// channel membership is a server-side concept this crate does not implement beyond this
/// seam, per the out-of-scope note on the outer server object.
pub trait ChannelDelegate: Send + Sync {
    fn join(&self, session_id: &str, channel: &str);
    fn leave(&self, session_id: &str, channel: &str);
    fn contains(&self, session_id: &str, channel: &str) -> bool;
}
