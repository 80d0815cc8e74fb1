// Shared constants for server defaults, timing, and protocol.

pub const DEFAULT_WS_BIND: &str = "0.0.0.0";
pub const DEFAULT_WS_PORT: u16 = 8765;
pub const DEFAULT_UDP_BIND: &str = "127.0.0.1";
pub const DEFAULT_UDP_PORT: u16 = 5005;
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 250;
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 32;
pub const MAX_DATAGRAM_LEN: usize = 65_507;
pub const INSPECT_LOG_INTERVAL_MS: u64 = 1_000;
pub const REPLAY_EMPTY_BACKOFF_MS: u64 = 1_000;
