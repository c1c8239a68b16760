use std::time::Duration;

/// Default maximum datagram payload, shared by all channels and peers.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1024;

/// Default receive timeout; doubles as the shutdown-polling cadence.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for a [`Router`](crate::Router).
///
/// `max_packet_size` caps both the encode capacity on the send path and the
/// receive buffer on the inbound path, so the two stay provably consistent.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Maximum datagram payload in bytes. Values that encode larger than this
    /// fail `write` instead of being truncated.
    pub max_packet_size: usize,
    /// Receive-loop socket timeout. Each timeout re-checks the running flag,
    /// so this bounds how long shutdown can lag behind `close`.
    pub recv_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            recv_timeout: DEFAULT_RECV_TIMEOUT,
        }
    }
}
