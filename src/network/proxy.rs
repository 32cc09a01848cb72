//! Upstream proxy hook.
//!
//! The client does not speak any proxy protocol itself. When a `[proxy]`
//! section is configured, the TCP leg of every connect attempt is delegated
//! to a [`ProxyConnector`] supplied by the application; TLS, if enabled, is
//! then layered over the tunnelled socket.

use std::io;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::config::ProxyConfig;

/// Opens a tunnelled TCP connection through an upstream proxy.
#[async_trait]
pub trait ProxyConnector: Send + Sync {
    /// Connect to `proxy` and ask it for a tunnel to `host:port`.
    ///
    /// The returned socket must already be relaying to the destination.
    async fn connect(&self, proxy: &ProxyConfig, host: &str, port: u16) -> io::Result<TcpStream>;
}
