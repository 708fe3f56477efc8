//! Centralized default constants for notex.
//!
//! Server configuration, the persistence layer, and the client all read their
//! fallback values from here instead of repeating magic numbers.

use std::time::Duration;

// =============================================================================
// NOTES
// =============================================================================

/// Background color assigned to notes created without one.
pub const BG_COLOR: &str = "#ffffff";

/// Description assigned to notes created without one.
pub const DESCRIPTION: &str = "";

// =============================================================================
// LIVE UPDATES (SSE)
// =============================================================================

/// SSE event name carrying a serialized [`crate::ChangeEvent`].
pub const CHANGE_EVENT_NAME: &str = "noteChange";

/// Comment sent as soon as a subscription is accepted.
pub const SSE_CONNECTED_COMMENT: &str = "connected";

/// Comment sent on every keep-alive tick.
pub const SSE_KEEPALIVE_COMMENT: &str = "keep-alive";

/// Keep-alive interval in seconds.
pub const SSE_KEEPALIVE_SECS: u64 = 25;

/// Per-subscriber queue capacity (events buffered for a slow reader).
pub const SSE_BUFFER: usize = 64;

/// A subscriber whose queue stays full this long is evicted.
pub const SSE_STALL_TIMEOUT_SECS: u64 = 60;

/// Keep-alive interval as a [`Duration`].
pub fn sse_keepalive() -> Duration {
    Duration::from_secs(SSE_KEEPALIVE_SECS)
}

/// Stall timeout as a [`Duration`].
pub fn sse_stall_timeout() -> Duration {
    Duration::from_secs(SSE_STALL_TIMEOUT_SECS)
}

// =============================================================================
// SERVER
// =============================================================================

/// Listen host.
pub const HOST: &str = "0.0.0.0";

/// Listen port.
pub const PORT: u16 = 8080;

/// Base URL the client uses when none is configured.
pub const API_BASE: &str = "http://localhost:8080";

// =============================================================================
// DATABASE
// =============================================================================

/// Database host used when assembling a connection URL from parts.
pub const DB_HOST: &str = "127.0.0.1";

/// Database port used when assembling a connection URL from parts.
pub const DB_PORT: u16 = 5432;

/// Maximum pooled connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Seconds to wait for a pooled connection.
pub const DB_CONNECT_TIMEOUT_SECS: u64 = 30;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keepalive_matches_constant() {
        assert_eq!(sse_keepalive(), Duration::from_secs(25));
    }

    #[test]
    fn test_stall_timeout_exceeds_keepalive() {
        assert!(sse_stall_timeout() > sse_keepalive());
    }

    #[test]
    fn test_default_bg_color_is_white() {
        assert_eq!(BG_COLOR, "#ffffff");
    }
}
