//! Byte stream to the server.
//!
//! [`TransportStream`] unifies plaintext and TLS sockets so the framing and
//! loop code never cares which one it is talking to. [`open`] performs one
//! connect attempt against a single address.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use super::proxy::ProxyConnector;
use super::tls;
use crate::config::ClientConfig;
use crate::error::ConnectionError;

/// A connected socket, plaintext or TLS.
pub enum TransportStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl TransportStream {
    pub fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

impl AsyncRead for TransportStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TransportStream::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            TransportStream::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for TransportStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            TransportStream::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            TransportStream::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TransportStream::Plain(stream) => Pin::new(stream).poll_flush(cx),
            TransportStream::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TransportStream::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            TransportStream::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

/// The server address currently in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    fn fatal(&self, reason: impl ToString) -> ConnectionError {
        ConnectionError::CouldNotConnect {
            address: self.address.clone(),
            port: self.port,
            reason: reason.to_string(),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Make one connect attempt to `endpoint`.
///
/// A plain socket failure comes back as [`ConnectionError::Io`] so the
/// caller can fail over to the next address. Proxy and TLS failures are
/// fatal and come back as [`ConnectionError::CouldNotConnect`].
pub async fn open(
    endpoint: &Endpoint,
    config: &ClientConfig,
    proxy: Option<&Arc<dyn ProxyConnector>>,
) -> Result<TransportStream, ConnectionError> {
    let limit = config.timeouts.connect;

    let tcp = match (&config.proxy, proxy) {
        (Some(proxy_config), Some(connector)) => {
            debug!(proxy = %proxy_config.host, "connecting through proxy");
            with_timeout(
                limit,
                connector.connect(proxy_config, &endpoint.address, endpoint.port),
            )
            .await
            .map_err(|e| endpoint.fatal(format!("proxy: {e}")))?
        }
        (Some(_), None) => {
            return Err(endpoint.fatal("proxy configured but no proxy connector set"));
        }
        (None, _) => {
            with_timeout(
                limit,
                TcpStream::connect((endpoint.address.as_str(), endpoint.port)),
            )
            .await?
        }
    };
    // Line-oriented traffic; do not batch small writes.
    if let Err(e) = tcp.set_nodelay(true) {
        debug!(error = %e, "failed to set TCP_NODELAY");
    }

    if !config.tls.enabled {
        return Ok(TransportStream::Plain(tcp));
    }

    let connector =
        tls::connector(&config.tls).map_err(|e| endpoint.fatal(format!("tls setup: {e}")))?;
    let name = tls::server_name(&endpoint.address).map_err(|e| endpoint.fatal(e))?;
    let stream = with_timeout(limit, connector.connect(name, tcp))
        .await
        .map_err(|e| endpoint.fatal(format!("tls handshake: {e}")))?;
    Ok(TransportStream::Tls(Box::new(stream)))
}

async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = io::Result<T>>,
) -> io::Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("timed out after {limit:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProxyConfig, ProxyKind};
    use async_trait::async_trait;
    use tokio::net::TcpListener;

    struct Direct;

    #[async_trait]
    impl ProxyConnector for Direct {
        async fn connect(&self, _proxy: &ProxyConfig, host: &str, port: u16) -> io::Result<TcpStream> {
            TcpStream::connect((host, port)).await
        }
    }

    fn proxy_config() -> ProxyConfig {
        ProxyConfig {
            kind: ProxyKind::Socks5,
            host: "proxy.invalid".into(),
            port: 1080,
            username: None,
            password: None,
        }
    }

    #[tokio::test]
    async fn test_plain_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let stream = open(&Endpoint::new("127.0.0.1", port), &ClientConfig::default(), None)
            .await
            .unwrap();
        assert!(!stream.is_tls());
    }

    #[tokio::test]
    async fn test_refused_is_retryable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let err = open(&Endpoint::new("127.0.0.1", port), &ClientConfig::default(), None)
            .await
            .err()
            .unwrap();
        assert!(err.is_retryable(), "{err}");
    }

    #[tokio::test]
    async fn test_proxy_without_connector_is_fatal() {
        let config = ClientConfig {
            proxy: Some(proxy_config()),
            ..ClientConfig::default()
        };
        let err = open(&Endpoint::new("127.0.0.1", 6667), &config, None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ConnectionError::CouldNotConnect { .. }));
    }

    #[tokio::test]
    async fn test_proxy_connector_is_used() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = ClientConfig {
            proxy: Some(proxy_config()),
            ..ClientConfig::default()
        };
        let connector: Arc<dyn ProxyConnector> = Arc::new(Direct);
        let stream = open(&Endpoint::new("127.0.0.1", port), &config, Some(&connector))
            .await
            .unwrap();
        assert!(!stream.is_tls());
    }

    #[tokio::test]
    async fn test_tls_handshake_failure_is_fatal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        // Accept and immediately hang up so the handshake fails.
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });
        let mut config = ClientConfig::default();
        config.tls.enabled = true;
        config.tls.verify_server_certificate = false;
        let err = open(&Endpoint::new("127.0.0.1", port), &config, None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ConnectionError::CouldNotConnect { .. }), "{err}");
        assert!(!err.is_retryable());
    }
}
