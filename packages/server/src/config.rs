//! Server configuration.

use std::time::Duration;

/// Default listen port
pub const DEFAULT_PORT: u16 = 3030;

/// Default idle deadline for a connection's receive wait
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Default capacity of each client's outbound queue
pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;

/// Upper bound for the outbound queue capacity
pub const MAX_OUTBOUND_BUFFER: usize = 1 << 16;

/// Runtime configuration for [`crate::ui::Server`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host address to bind to (e.g., "127.0.0.1")
    pub host: String,
    /// Port number to bind to
    pub port: u16,
    /// Disconnect clients that send nothing, not even a pong, for this long.
    /// The server pings at half this interval. `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Capacity of each client's outbound queue, clamped to `1..=MAX_OUTBOUND_BUFFER`
    pub outbound_buffer: usize,
    /// Remove a room from the registry when its last member leaves
    pub evict_empty_rooms: bool,
}

impl ServerConfig {
    /// `host:port` string for binding the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            evict_empty_rooms: false,
        }
    }
}
