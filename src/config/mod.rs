//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: The top-level [`ClientConfig`], the `[server]` section and loading
//! - [`transport`]: TLS, proxy and socket timeout sections
//! - [`timing`]: Scheduler, keepalive and retry sections
//! - [`sync`]: Channel state tracking and recovery switches
//! - [`identity`]: The nickname and login credentials handed to `Client::login`
//! - [`validation`]: Startup checks

mod defaults;
mod duration;
mod identity;
mod sync;
mod timing;
mod transport;
mod types;
mod validation;

pub use identity::{Identity, SaslCredentials};
pub use sync::SyncConfig;
pub use timing::{KeepaliveConfig, RetryConfig, SchedulerConfig};
pub use transport::{ProxyConfig, ProxyKind, TimeoutsConfig, TlsConfig};
pub use types::{ClientConfig, ConfigError, ServerConfig};
pub use validation::{ValidationError, validate};
