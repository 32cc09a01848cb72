//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::time::Duration;

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_port() -> u16 {
    6667
}

pub fn default_encoding() -> String {
    "utf-8".to_string()
}

// =============================================================================
// Socket Timeout Defaults
// =============================================================================

pub fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

pub fn default_socket_timeout() -> Duration {
    Duration::from_secs(600)
}

// =============================================================================
// Scheduler / Keepalive Defaults
// =============================================================================

pub fn default_send_delay() -> Duration {
    Duration::from_millis(200)
}

pub fn default_ping_interval() -> Duration {
    Duration::from_secs(60)
}

pub fn default_ping_timeout() -> Duration {
    Duration::from_secs(300)
}

pub fn default_check_interval() -> Duration {
    Duration::from_secs(60)
}

// =============================================================================
// Retry Defaults
// =============================================================================

pub fn default_retry_limit() -> u32 {
    3
}

pub fn default_retry_delay() -> Duration {
    Duration::from_secs(30)
}

// =============================================================================
// Identity Defaults
// =============================================================================

pub fn default_usermode() -> String {
    "0".to_string()
}
