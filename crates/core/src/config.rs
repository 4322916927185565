/// Tunable liveness and timeout parameters for a session.
///
/// Defaults match the protocol defaults: a 25s/60s ping interval/timeout pair (used by
/// inbound sessions and advertised to the peer during handshake), a 10s connect timeout,
/// a 600s job deadline, and the 5s liveness tick that drives all of the above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub ping_interval_ms: u64,
    pub ping_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub job_timeout_ms: u64,
    pub liveness_tick_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            ping_interval_ms: 25_000,
            ping_timeout_ms: 60_000,
            connect_timeout_ms: 10_000,
            job_timeout_ms: 600_000,
            liveness_tick_ms: 5_000,
        }
    }
}
