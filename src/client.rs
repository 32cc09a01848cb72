//! The public client handle.
//!
//! [`Client`] ties the connection, the synchronizer, the list fetches and
//! event dispatch together. It is a cheap handle; clones share one session.
//!
//! The caller drives processing with [`Client::listen`] (or one item at a
//! time with [`Client::listen_once`]). That context is the only writer of
//! the channel/user model; every other accessor reads a snapshot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use slirc_proto::{IrcMessage, MessageKind, Outgoing, Priority, command};
use tokio::sync::{broadcast, mpsc};
use tracing::{Instrument, debug, info, trace, warn};

use crate::config::{ClientConfig, Identity};
use crate::dispatch::{BROADCAST_CAPACITY, EventBus, Listener, Listeners};
use crate::error::{ClientError, ConnectionError, Result};
use crate::event::{BanInfo, ChannelInfo, Event, WhoInfo};
use crate::fetch::Fetches;
use crate::network::{Connection, Endpoint, Inbound, ProxyConnector};
use crate::state::{Channel, ChannelUser, User};
use crate::sync::{SyncContext, Synchronizer};
use crate::telemetry::{OpTimer, spans};

struct Inner {
    config: Arc<ClientConfig>,
    connection: Connection,
    inbound: tokio::sync::Mutex<mpsc::UnboundedReceiver<Inbound>>,
    events: EventBus,
    listeners: Listeners,
    broadcast: broadcast::Sender<Event>,
    sync: Mutex<Synchronizer>,
    fetches: Fetches,
    identity: Mutex<Option<Identity>>,
    /// Addresses and port of the last connect, reused by reconnect.
    target: Mutex<Option<(Vec<String>, u16)>>,
}

/// An IRC client session.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("connected", &self.is_connected())
            .field("registered", &self.is_registered())
            .field("nickname", &self.nickname())
            .finish()
    }
}

impl Client {
    /// Create a client. Must be called inside a tokio runtime.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Create a client that tunnels its connection through `proxy`.
    pub fn with_proxy(config: ClientConfig, proxy: Arc<dyn ProxyConnector>) -> Result<Self> {
        Self::build(config, Some(proxy))
    }

    fn build(config: ClientConfig, proxy: Option<Arc<dyn ProxyConnector>>) -> Result<Self> {
        tokio::runtime::Handle::try_current().map_err(|_| ClientError::NoRuntime)?;
        config.validate()?;

        let config = Arc::new(config);
        let listeners: Listeners = Arc::new(RwLock::new(Vec::new()));
        let (broadcast, _) = broadcast::channel(BROADCAST_CAPACITY);
        let events = EventBus::spawn(Arc::clone(&listeners), broadcast.clone());
        let (connection, inbound) = Connection::new(Arc::clone(&config), events.clone(), proxy);
        let sync = Synchronizer::new(config.sync.clone());

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                connection,
                inbound: tokio::sync::Mutex::new(inbound),
                events,
                listeners,
                broadcast,
                sync: Mutex::new(sync),
                fetches: Fetches::default(),
                identity: Mutex::new(None),
                target: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------
    // Subscription
    // ------------------------------------------------------------------

    /// Register a callback run for every event on the blocking pool.
    pub fn add_listener(&self, listener: Listener) {
        self.inner.listeners.write().push(listener);
    }

    /// A broadcast receiver of every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.broadcast.subscribe()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Connect to the configured server candidates.
    pub async fn connect(&self) -> Result<Endpoint> {
        let server = &self.inner.config.server;
        self.connect_to(&server.addresses, server.port).await
    }

    /// Connect to the first reachable address of `addresses`.
    pub async fn connect_to(&self, addresses: &[String], port: u16) -> Result<Endpoint> {
        if self.inner.connection.is_connected() {
            return Err(ConnectionError::AlreadyConnected.into());
        }
        self.inner.sync.lock().reset_session();
        *self.inner.target.lock() = Some((addresses.to_vec(), port));
        Ok(self.inner.connection.connect(addresses, port).await?)
    }

    /// Register with the server. The identity is kept for relogin after a
    /// reconnect.
    pub async fn login(&self, identity: Identity) -> Result<()> {
        let lines = self.inner.sync.lock().begin_login(&identity);
        info!(nickname = ?identity.primary_nickname(), sasl = identity.sasl.is_some(), "logging in");
        *self.inner.identity.lock() = Some(identity);
        for line in lines {
            self.send(line).await?;
        }
        Ok(())
    }

    /// Process inbound lines until the session ends.
    ///
    /// Returns `Ok(())` after a disconnect or server close that is not
    /// followed by a reconnect.
    pub async fn listen(&self) -> Result<()> {
        while self.listen_once().await? {}
        Ok(())
    }

    /// Process one inbound item. Returns whether the session is still up.
    pub async fn listen_once(&self) -> Result<bool> {
        if !self.inner.connection.is_connected() {
            return Ok(false);
        }
        let item = self.inner.inbound.lock().await.recv().await;
        let Some(item) = item else {
            return Ok(false);
        };
        if item.generation() != self.inner.connection.generation() {
            trace!(generation = item.generation(), "dropping item from old session");
            return Ok(self.inner.connection.is_connected());
        }
        if !self.inner.connection.is_connected() {
            // The session was torn down while we waited.
            return Ok(false);
        }

        match item {
            Inbound::Line { line, .. } => {
                self.process_line(&line).await;
                Ok(true)
            }
            Inbound::Failed { error, .. } => self.on_failure(error).await,
            Inbound::Closed { .. } if self.inner.connection.is_disconnecting() => {
                self.teardown().await;
                Ok(false)
            }
            Inbound::Closed { .. } => {
                let eof = std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "server closed the connection",
                );
                self.on_failure(ConnectionError::Io(eof)).await
            }
        }
    }

    async fn on_failure(&self, error: ConnectionError) -> Result<bool> {
        self.inner
            .events
            .emit(Event::ConnectionError(Arc::new(error)));
        if self.inner.config.retry.auto_reconnect {
            self.reconnect().await?;
            Ok(true)
        } else {
            self.teardown().await;
            Ok(false)
        }
    }

    async fn process_line(&self, line: &str) {
        let msg = match IrcMessage::parse(line) {
            Ok(msg) => Arc::new(msg),
            Err(e) => {
                warn!(error = %e, line = %line, "dropping unparsable line");
                return;
            }
        };

        let span = spans::inbound(msg.command());
        let out = span.in_scope(|| {
            let connection = &self.inner.connection;
            let lag = if msg.kind() == MessageKind::Pong {
                connection.on_pong()
            } else {
                connection.lag()
            };
            let ctx = SyncContext {
                now: Instant::now(),
                lag,
            };
            self.inner.sync.lock().handle(&msg, ctx)
        });

        if out.registered {
            self.inner.connection.set_registered();
        }
        async {
            for line in out.outgoing {
                if let Err(e) = self.inner.connection.send(line).await {
                    warn!(error = %e, "follow-up line not sent");
                }
            }
        }
        .instrument(span)
        .await;

        self.inner.fetches.observe(&out.events);
        for event in out.events {
            self.inner.events.emit(event);
        }
    }

    /// Close the connection. Outstanding fetches fail with
    /// [`ClientError::FetchAborted`].
    pub async fn disconnect(&self) -> Result<()> {
        if !self.inner.connection.is_connected() {
            return Err(ConnectionError::NotConnected.into());
        }
        self.teardown().await;
        Ok(())
    }

    /// Disconnect, ignoring a session that is already gone.
    async fn teardown(&self) {
        let events = &self.inner.events;
        events.emit(Event::Disconnecting);
        match self.inner.connection.disconnect().await {
            Ok(()) => events.emit(Event::Disconnected),
            Err(ConnectionError::NotConnected) => debug!("already disconnected"),
            Err(e) => warn!(error = %e, "disconnect failed"),
        }
        self.inner.fetches.abort_all();
    }

    /// Tear the session down and connect again to the same candidates.
    ///
    /// Login and channel membership are replayed when `sync.auto_relogin`
    /// and `sync.auto_rejoin` are set. Does nothing when not connected.
    pub async fn reconnect(&self) -> Result<()> {
        if !self.inner.connection.is_connected() {
            debug!("reconnect requested while disconnected");
            return Ok(());
        }
        let _timer = OpTimer::new("reconnect");
        let sync_config = self.inner.config.sync.clone();
        let rejoin = if sync_config.auto_rejoin {
            self.inner.sync.lock().rejoin_targets()
        } else {
            Vec::new()
        };
        let (addresses, port) = self.inner.target.lock().clone().unwrap_or_else(|| {
            let server = &self.inner.config.server;
            (server.addresses.clone(), server.port)
        });

        self.teardown().await;
        info!(channels = rejoin.len(), "reconnecting");
        self.connect_to(&addresses, port).await?;

        let identity = self.inner.identity.lock().clone();
        if sync_config.auto_relogin
            && let Some(identity) = identity
        {
            self.login(identity).await?;
        }
        for (channel, key) in rejoin {
            self.join_with(&channel, key.as_deref(), Priority::High)
                .await?;
        }
        Ok(())
    }

    /// Send `QUIT` now and treat the following close as intentional.
    pub async fn quit(&self, reason: Option<&str>) -> Result<()> {
        self.inner.connection.set_disconnecting();
        self.send(command::quit(reason).with_priority(Priority::Critical))
            .await
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    /// Queue a line at its priority, or write it now if it is Critical.
    pub async fn send(&self, out: Outgoing) -> Result<()> {
        Ok(self.inner.connection.send(out).await?)
    }

    /// Join a channel, remembering the key for rejoins.
    pub async fn join(&self, channel: &str, key: Option<&str>) -> Result<()> {
        self.join_with(channel, key, Priority::Medium).await
    }

    async fn join_with(&self, channel: &str, key: Option<&str>, priority: Priority) -> Result<()> {
        self.inner.sync.lock().note_join_request(channel, key);
        self.send(command::join(channel, key).with_priority(priority))
            .await
    }

    /// Lines waiting in the outbound scheduler.
    pub fn queued(&self) -> usize {
        self.inner.connection.queued()
    }

    // ------------------------------------------------------------------
    // Blocking list fetches
    // ------------------------------------------------------------------

    /// `LIST`, waiting for the end-of-list reply.
    pub async fn list_channels(&self, channel: Option<&str>) -> Result<Vec<ChannelInfo>> {
        self.inner
            .fetches
            .list
            .run(None, self.send(command::list(channel)))
            .await
    }

    /// `WHO mask`, waiting for the end-of-who reply for that mask.
    pub async fn who(&self, mask: &str) -> Result<Vec<WhoInfo>> {
        self.inner
            .fetches
            .who
            .run(Some(mask), self.send(command::who(mask)))
            .await
    }

    /// `MODE channel +b`, waiting for the end of the channel's ban list.
    pub async fn ban_list(&self, channel: &str) -> Result<Vec<BanInfo>> {
        self.inner
            .fetches
            .bans
            .run(Some(channel), self.send(command::mode(channel, Some("+b"))))
            .await
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    pub fn is_connected(&self) -> bool {
        self.inner.connection.is_connected()
    }

    pub fn is_registered(&self) -> bool {
        self.inner.connection.is_registered()
    }

    pub fn nickname(&self) -> Option<String> {
        self.inner.sync.lock().nickname().map(str::to_owned)
    }

    pub fn is_me(&self, nick: &str) -> bool {
        self.inner.sync.lock().is_me(nick)
    }

    /// Our user mode letters.
    pub fn usermode(&self) -> String {
        self.inner.sync.lock().model().usermode.clone()
    }

    /// Time since the last PONG, or since the probe went unanswered.
    pub fn lag(&self) -> Duration {
        self.inner.connection.lag()
    }

    pub fn joined_channels(&self) -> Vec<String> {
        self.inner.sync.lock().joined_channels()
    }

    pub fn is_joined(&self, channel: &str) -> bool {
        self.inner.sync.lock().is_joined(channel)
    }

    /// A copy of a tracked channel.
    pub fn channel(&self, name: &str) -> Option<Channel> {
        self.inner.sync.lock().model().channel(name).cloned()
    }

    /// Names of every tracked channel.
    pub fn channels(&self) -> Vec<String> {
        self.inner
            .sync
            .lock()
            .model()
            .channels()
            .map(|c| c.name.clone())
            .collect()
    }

    /// A copy of a tracked user.
    pub fn user(&self, nick: &str) -> Option<User> {
        self.inner.sync.lock().model().user(nick).cloned()
    }

    pub fn channel_user(&self, channel: &str, nick: &str) -> Option<ChannelUser> {
        self.inner.sync.lock().model().channel_user(channel, nick)
    }

    /// A server ISUPPORT token, as `Some(value)` for `KEY=value` and
    /// `Some(None)` for a bare `KEY`.
    pub fn isupport(&self, key: &str) -> Option<Option<String>> {
        self.inner
            .sync
            .lock()
            .isupport()
            .get(key)
            .map(|v| v.map(str::to_owned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_runtime() {
        let err = Client::new(ClientConfig::default()).unwrap_err();
        assert!(matches!(err, ClientError::NoRuntime));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = ClientConfig::default();
        config.server.port = 0;
        let err = Client::new(config).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn test_idle_client() {
        let client = Client::new(ClientConfig::default()).unwrap();
        assert!(!client.is_connected());
        assert!(!client.listen_once().await.unwrap());
        assert!(client.reconnect().await.is_ok());
        assert!(matches!(
            client.disconnect().await,
            Err(ClientError::Connection(ConnectionError::NotConnected))
        ));
        assert!(matches!(
            client.send(command::quit(None).with_priority(Priority::Critical)).await,
            Err(ClientError::Connection(ConnectionError::NotConnected))
        ));
        assert!(client.nickname().is_none());
        assert!(client.channels().is_empty());
    }

    #[tokio::test]
    async fn test_queued_sends_wait_for_session() {
        let client = Client::new(ClientConfig::default()).unwrap();
        client.join("#rust", Some("key")).await.unwrap();
        assert_eq!(client.queued(), 1);
    }
}
