//! Transport configuration: TLS, proxy and socket timeouts.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::{default_connect_timeout, default_socket_timeout, default_true};

/// TLS settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Wrap the connection in TLS.
    pub enabled: bool,
    /// Verify the server certificate against the native root store.
    #[serde(default = "default_true")]
    pub verify_server_certificate: bool,
    /// PEM client certificate chain presented to the server.
    pub client_certificate: Option<PathBuf>,
    /// PEM private key for `client_certificate`.
    pub client_key: Option<PathBuf>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            verify_server_certificate: true,
            client_certificate: None,
            client_key: None,
        }
    }
}

/// Proxy protocol family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    Http,
    Socks4,
    Socks4a,
    Socks5,
}

/// Upstream proxy settings, handed to a
/// [`ProxyConnector`](crate::network::ProxyConnector).
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    pub kind: ProxyKind,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Socket timeouts. No per-command timeout exists.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// TCP connect plus TLS/proxy handshake.
    #[serde(deserialize_with = "super::duration::deserialize")]
    pub connect: Duration,
    /// Maximum time a single write may block.
    #[serde(deserialize_with = "super::duration::deserialize")]
    pub socket_send: Duration,
    /// Maximum silence on the read side before the connection is failed.
    #[serde(deserialize_with = "super::duration::deserialize")]
    pub socket_receive: Duration,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            connect: default_connect_timeout(),
            socket_send: default_socket_timeout(),
            socket_receive: default_socket_timeout(),
        }
    }
}
