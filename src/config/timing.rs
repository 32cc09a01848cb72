//! Scheduler, keepalive and retry timing.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{
    default_check_interval, default_ping_interval, default_ping_timeout, default_retry_delay,
    default_retry_limit, default_send_delay,
};

/// Outbound scheduler pacing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Interval between scheduler cycles.
    #[serde(deserialize_with = "super::duration::deserialize")]
    pub send_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            send_delay: default_send_delay(),
        }
    }
}

/// Keepalive probing.
///
/// - `ping_interval`: idle time since the last PONG before a PING is sent (default: 60)
/// - `ping_timeout`: time without a PONG after a PING before the link is failed (default: 300)
/// - `check_interval`: how often the keepalive loop wakes (default: 60)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeepaliveConfig {
    #[serde(deserialize_with = "super::duration::deserialize")]
    pub ping_interval: Duration,
    #[serde(deserialize_with = "super::duration::deserialize")]
    pub ping_timeout: Duration,
    #[serde(deserialize_with = "super::duration::deserialize")]
    pub check_interval: Duration,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            ping_interval: default_ping_interval(),
            ping_timeout: default_ping_timeout(),
            check_interval: default_check_interval(),
        }
    }
}

/// Connect retry and reconnect policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retry the whole candidate list after socket failures.
    pub auto_retry: bool,
    /// Passes over the candidate list before giving up; 0 is unlimited.
    pub auto_retry_limit: u32,
    /// Pause between passes.
    #[serde(deserialize_with = "super::duration::deserialize")]
    pub auto_retry_delay: Duration,
    /// Reconnect automatically after a connection error.
    pub auto_reconnect: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            auto_retry: false,
            auto_retry_limit: default_retry_limit(),
            auto_retry_delay: default_retry_delay(),
            auto_reconnect: false,
        }
    }
}
