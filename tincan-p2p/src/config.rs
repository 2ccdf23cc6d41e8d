//! Chat endpoint configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Well-known TCP port shared by all chat listeners.
pub const DEFAULT_PORT: u16 = 7341;

/// Maximum number of bytes consumed by a single socket read.
///
/// The wire has no framing, so one read is one message. A message whose
/// UTF-8 encoding exceeds this size is split across reads and delivered
/// as multiple messages.
pub const READ_CHUNK_SIZE: usize = 2048;

/// Reserved message text signaling an intentional disconnect.
///
/// The protocol has no control channel: a message whose full body equals
/// this string is indistinguishable from the disconnect signal, so the
/// string must never be sent as ordinary chat content. The match is
/// exact; any variation in case or whitespace is delivered as a normal
/// message.
pub const CLOSE_SENTINEL: &str = "Close Connection";

/// Default timeout for establishing an outbound connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(200);

/// Configuration for a chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Address to bind the listener to.
    pub bind_addr: SocketAddr,

    /// Timeout for establishing outbound connections.
    pub connect_timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ChatConfig {
    /// Create a configuration with the specified bind address.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Default::default()
        }
    }

    /// Set the outbound connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
