//! Channel state tracking and recovery switches.

use serde::Deserialize;

use super::defaults::default_true;

/// Channel state tracking and recovery.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maintain the live channel/user model.
    pub active_channel_syncing: bool,
    /// Rejoin channels after a reconnect.
    pub auto_rejoin: bool,
    /// Rejoin a channel after being kicked from it.
    pub auto_rejoin_on_kick: bool,
    /// Replay login after a reconnect.
    pub auto_relogin: bool,
    /// Pick another nickname on collision during login.
    #[serde(default = "default_true")]
    pub auto_nick_handling: bool,
    /// Force the half-op/admin/owner roles on or off. Unset follows the
    /// server's `PREFIX` advertisement.
    pub extended_roles: Option<bool>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            active_channel_syncing: false,
            auto_rejoin: false,
            auto_rejoin_on_kick: false,
            auto_relogin: false,
            auto_nick_handling: true,
            extended_roles: None,
        }
    }
}
