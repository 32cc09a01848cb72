//! Connection - owns the server socket and its background loops.
//!
//! Each live session runs three tokio tasks next to the caller-driven
//! processing context:
//!
//! ```text
//!                 ┌────────────────────────────────────────┐
//!                 │               Connection               │
//!                 │                                        │
//!   socket ──────▶│  read loop ──▶ inbound queue ─────────────▶ Client::listen
//!                 │                                        │
//!   socket ◀──────│  send loop ◀── Scheduler ◀─────────────────  queued sends
//!          ◀──────│◀───────────────────────────────────────────  Critical sends
//!                 │                                        │
//!                 │  keepalive loop ── PING / timeout      │
//!                 └────────────────────────────────────────┘
//! ```
//!
//! Loops share only the scheduler, the keepalive clock, the writer and a
//! few atomic flags. Every inbound item carries the session generation so
//! the processing context can ignore leftovers from a session that has
//! already been torn down.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use slirc_proto::{LineCodec, Outgoing, Priority, ProtocolError};
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{Instrument, debug, error, info, instrument, trace, warn};

use super::keepalive::{Keepalive, KeepaliveAction};
use super::proxy::ProxyConnector;
use super::scheduler::Scheduler;
use super::transport::{self, Endpoint, TransportStream};
use crate::config::ClientConfig;
use crate::dispatch::EventBus;
use crate::error::ConnectionError;
use crate::event::Event;
use crate::telemetry::spans;

type Writer = Arc<tokio::sync::Mutex<FramedWrite<WriteHalf<TransportStream>, LineCodec>>>;

/// Something the background loops hand to the processing context.
#[derive(Debug)]
pub enum Inbound {
    /// One decoded line.
    Line { generation: u64, line: String },
    /// The session failed: I/O error, socket timeout or keepalive timeout.
    Failed {
        generation: u64,
        error: ConnectionError,
    },
    /// The server closed the socket.
    Closed { generation: u64 },
}

impl Inbound {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Line { generation, .. }
            | Self::Failed { generation, .. }
            | Self::Closed { generation } => *generation,
        }
    }
}

#[derive(Debug, Default)]
struct Flags {
    connected: AtomicBool,
    registered: AtomicBool,
    error: AtomicBool,
    disconnecting: AtomicBool,
}

/// State shared with the background loops.
struct Shared {
    config: Arc<ClientConfig>,
    flags: Flags,
    scheduler: Mutex<Scheduler>,
    keepalive: Mutex<Keepalive>,
    inbound: mpsc::UnboundedSender<Inbound>,
}

impl Shared {
    /// Flag the session as failed and tell the processing context, once.
    fn fail(&self, generation: u64, error: ConnectionError) {
        if self.flags.error.swap(true, Ordering::SeqCst) {
            debug!(error = %error, "session already failed");
            return;
        }
        warn!(error = %error, code = error.error_code(), "connection failed");
        let _ = self.inbound.send(Inbound::Failed { generation, error });
    }
}

struct Session {
    generation: u64,
    endpoint: Endpoint,
    writer: Writer,
    cancel: CancellationToken,
    reader: JoinHandle<()>,
    sender: JoinHandle<()>,
    keepalive: JoinHandle<()>,
    _guard: DropGuard,
}

/// The transport and outbound scheduler for one client.
pub struct Connection {
    shared: Arc<Shared>,
    events: EventBus,
    proxy: Option<Arc<dyn ProxyConnector>>,
    generation: AtomicU64,
    session: Mutex<Option<Session>>,
    connecting: tokio::sync::Mutex<()>,
}

impl Connection {
    /// Create an idle connection. Inbound items are delivered on the
    /// returned receiver.
    pub fn new(
        config: Arc<ClientConfig>,
        events: EventBus,
        proxy: Option<Arc<dyn ProxyConnector>>,
    ) -> (Self, mpsc::UnboundedReceiver<Inbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let keepalive = Keepalive::new(&config.keepalive, Instant::now());
        let shared = Arc::new(Shared {
            config,
            flags: Flags::default(),
            scheduler: Mutex::new(Scheduler::new()),
            keepalive: Mutex::new(keepalive),
            inbound: tx,
        });
        let connection = Self {
            shared,
            events,
            proxy,
            generation: AtomicU64::new(0),
            session: Mutex::new(None),
            connecting: tokio::sync::Mutex::new(()),
        };
        (connection, rx)
    }

    pub fn is_connected(&self) -> bool {
        self.shared.flags.connected.load(Ordering::SeqCst)
    }

    pub fn is_registered(&self) -> bool {
        self.shared.flags.registered.load(Ordering::SeqCst)
    }

    /// Whether the current session has failed and is waiting to be torn
    /// down.
    pub fn has_error(&self) -> bool {
        self.shared.flags.error.load(Ordering::SeqCst)
    }

    pub fn is_disconnecting(&self) -> bool {
        self.shared.flags.disconnecting.load(Ordering::SeqCst)
    }

    /// Generation of the live session, or of the last one.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// The address and port of the live session.
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.session.lock().as_ref().map(|s| s.endpoint.clone())
    }

    /// Start releasing queued lines. Called once login completes.
    pub fn set_registered(&self) {
        self.shared.flags.registered.store(true, Ordering::SeqCst);
        self.shared.keepalive.lock().reset(Instant::now());
    }

    /// Mark an intentional shutdown so the following EOF is not an error.
    pub fn set_disconnecting(&self) {
        self.shared.flags.disconnecting.store(true, Ordering::SeqCst);
    }

    /// Record a PONG and return the measured lag.
    pub fn on_pong(&self) -> Duration {
        let now = Instant::now();
        let mut keepalive = self.shared.keepalive.lock();
        keepalive.on_pong(now);
        keepalive.lag(now)
    }

    pub fn lag(&self) -> Duration {
        self.shared.keepalive.lock().lag(Instant::now())
    }

    /// Number of lines waiting in the scheduler.
    pub fn queued(&self) -> usize {
        self.shared.scheduler.lock().len()
    }

    /// Send a line. Critical lines are written now and fail if there is no
    /// session; everything else is queued and released by the send loop.
    pub async fn send(&self, out: Outgoing) -> Result<(), ConnectionError> {
        if out.priority == Priority::Critical {
            return self.send_critical(&out.line).await;
        }
        trace!(line = %out.line, priority = ?out.priority, "queued");
        self.shared.scheduler.lock().push(out);
        Ok(())
    }

    async fn send_critical(&self, line: &str) -> Result<(), ConnectionError> {
        let (generation, writer) = {
            let session = self.session.lock();
            let session = session.as_ref().ok_or(ConnectionError::NotConnected)?;
            (session.generation, Arc::clone(&session.writer))
        };
        let timeout = self.shared.config.timeouts.socket_send;
        match write_line(&writer, line, timeout).await {
            Ok(()) => Ok(()),
            Err(ConnectionError::Protocol(e @ ProtocolError::LineTooLong { .. })) => {
                Err(ConnectionError::Protocol(e))
            }
            Err(e) => {
                let reported = ConnectionError::Io(std::io::Error::other(e.to_string()));
                self.shared.fail(generation, reported);
                Err(e)
            }
        }
    }

    /// Connect to the first reachable address.
    ///
    /// Addresses are tried in order. When all of them fail and auto-retry
    /// is on, the whole list is retried after the configured delay until the
    /// attempt limit (0 = unlimited) is reached, emitting
    /// [`Event::AutoConnectFailed`] after each exhausted pass.
    #[instrument(skip(self, addresses), name = "connect")]
    pub async fn connect(
        &self,
        addresses: &[String],
        port: u16,
    ) -> Result<Endpoint, ConnectionError> {
        let _connecting = self.connecting.lock().await;
        if self.session.lock().is_some() {
            return Err(ConnectionError::AlreadyConnected);
        }

        let retry = &self.shared.config.retry;
        let mut attempt: u32 = 0;
        loop {
            let mut last_error = None;
            for address in addresses {
                let endpoint = Endpoint::new(address.as_str(), port);
                info!(endpoint = %endpoint, "connecting");
                self.events.emit(Event::Connecting {
                    address: endpoint.address.clone(),
                    port,
                });

                match transport::open(&endpoint, &self.shared.config, self.proxy.as_ref()).await {
                    Ok(stream) => {
                        self.start(stream, endpoint.clone()).await?;
                        info!(endpoint = %endpoint, "connected");
                        self.events.emit(Event::Connected {
                            address: endpoint.address.clone(),
                            port,
                        });
                        return Ok(endpoint);
                    }
                    Err(e) if e.is_retryable() => {
                        warn!(endpoint = %endpoint, error = %e, "connect attempt failed");
                        last_error = Some(e);
                    }
                    Err(e) => {
                        error!(endpoint = %endpoint, error = %e, "connect failed");
                        return Err(e);
                    }
                }
            }

            let exhausted = || ConnectionError::CouldNotConnect {
                address: addresses.join(","),
                port,
                reason: match &last_error {
                    Some(e) => e.to_string(),
                    None => "no server addresses".to_owned(),
                },
            };
            if !retry.auto_retry || addresses.is_empty() {
                return Err(exhausted());
            }

            attempt += 1;
            warn!(attempt, "all server addresses failed");
            self.events.emit(Event::AutoConnectFailed { attempt });
            if retry.auto_retry_limit != 0 && attempt >= retry.auto_retry_limit {
                return Err(exhausted());
            }
            tokio::time::sleep(retry.auto_retry_delay).await;
        }
    }

    async fn start(&self, stream: TransportStream, endpoint: Endpoint) -> Result<(), ConnectionError> {
        let codec = LineCodec::new(&self.shared.config.server.encoding)?;
        let (read_half, write_half) = tokio::io::split(stream);
        let mut framed = FramedWrite::new(write_half, codec.clone());

        let bom = codec.byte_order_mark();
        if self.shared.config.server.byte_order_mark && !bom.is_empty() {
            let raw = framed.get_mut();
            raw.write_all(bom).await?;
            raw.write_all(b"\r\n").await?;
            raw.flush().await?;
            debug!("sent byte order mark");
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let flags = &self.shared.flags;
        flags.registered.store(false, Ordering::SeqCst);
        flags.error.store(false, Ordering::SeqCst);
        flags.disconnecting.store(false, Ordering::SeqCst);
        flags.connected.store(true, Ordering::SeqCst);
        self.shared.scheduler.lock().reset_cycle();
        self.shared.keepalive.lock().reset(Instant::now());

        let writer: Writer = Arc::new(tokio::sync::Mutex::new(framed));
        let cancel = CancellationToken::new();
        let span = spans::connection(&endpoint.address, endpoint.port);

        let reader = tokio::spawn(
            read_loop(
                Arc::clone(&self.shared),
                FramedRead::new(read_half, codec),
                cancel.clone(),
                generation,
            )
            .instrument(span.clone()),
        );
        let sender = tokio::spawn(
            send_loop(
                Arc::clone(&self.shared),
                Arc::clone(&writer),
                cancel.clone(),
                generation,
            )
            .instrument(span.clone()),
        );
        let keepalive = tokio::spawn(
            keepalive_loop(
                Arc::clone(&self.shared),
                Arc::clone(&writer),
                cancel.clone(),
                generation,
                endpoint.address.clone(),
            )
            .instrument(span),
        );

        *self.session.lock() = Some(Session {
            generation,
            endpoint,
            writer,
            _guard: cancel.clone().drop_guard(),
            cancel,
            reader,
            sender,
            keepalive,
        });
        Ok(())
    }

    /// Stop the background loops and close the socket.
    ///
    /// Loops are stopped in a fixed order (read, send, keepalive) and the
    /// socket is closed only after all three have exited.
    pub async fn disconnect(&self) -> Result<(), ConnectionError> {
        let session = self.session.lock().take().ok_or(ConnectionError::NotConnected)?;
        info!(endpoint = %session.endpoint, "disconnecting");

        session.cancel.cancel();
        for (name, handle) in [
            ("read", session.reader),
            ("send", session.sender),
            ("keepalive", session.keepalive),
        ] {
            if let Err(e) = handle.await {
                error!(task = name, error = %e, "background loop panicked");
            }
        }

        {
            let mut writer = session.writer.lock().await;
            if let Err(e) = SinkExt::<String>::close(&mut *writer).await {
                debug!(error = %e, "error closing socket");
            }
        }

        let flags = &self.shared.flags;
        flags.connected.store(false, Ordering::SeqCst);
        flags.registered.store(false, Ordering::SeqCst);
        flags.disconnecting.store(false, Ordering::SeqCst);
        // Wakes a listener still waiting on this session.
        let _ = self.shared.inbound.send(Inbound::Closed {
            generation: session.generation,
        });
        info!(endpoint = %session.endpoint, "disconnected");
        Ok(())
    }
}

async fn write_line(writer: &Writer, line: &str, timeout: Duration) -> Result<(), ConnectionError> {
    let mut writer = writer.lock().await;
    match tokio::time::timeout(timeout, writer.send(line.to_owned())).await {
        Ok(Ok(())) => {
            debug!(line = %line, "sent");
            Ok(())
        }
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(ConnectionError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("send timed out after {timeout:?}"),
        ))),
    }
}

async fn read_loop(
    shared: Arc<Shared>,
    mut lines: FramedRead<ReadHalf<TransportStream>, LineCodec>,
    cancel: CancellationToken,
    generation: u64,
) {
    let timeout = shared.config.timeouts.socket_receive;
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = tokio::time::timeout(timeout, lines.next()) => next,
        };

        match next {
            Ok(Some(Ok(line))) => {
                trace!(line = %line, "received");
                if shared.inbound.send(Inbound::Line { generation, line }).is_err() {
                    break;
                }
            }
            Ok(Some(Err(e))) => {
                shared.fail(generation, e.into());
                break;
            }
            Ok(None) => {
                if shared.flags.disconnecting.load(Ordering::SeqCst) {
                    debug!("server closed connection after quit");
                } else {
                    info!("server closed connection");
                }
                let _ = shared.inbound.send(Inbound::Closed { generation });
                break;
            }
            Err(_) => {
                shared.fail(
                    generation,
                    ConnectionError::Io(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("nothing received for {timeout:?}"),
                    )),
                );
                break;
            }
        }
    }
    debug!("read loop stopped");
}

async fn send_loop(shared: Arc<Shared>, writer: Writer, cancel: CancellationToken, generation: u64) {
    let timeout = shared.config.timeouts.socket_send;
    let mut interval = tokio::time::interval(shared.config.scheduler.send_delay);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    'ticks: loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }
        let flags = &shared.flags;
        if !flags.registered.load(Ordering::SeqCst) || flags.error.load(Ordering::SeqCst) {
            continue;
        }

        let batch = shared.scheduler.lock().tick();
        let mut batch = batch.into_iter();
        while let Some((priority, line)) = batch.next() {
            let result = tokio::select! {
                _ = cancel.cancelled() => Err(None),
                r = write_line(&writer, &line, timeout) => r.map_err(Some),
            };
            match result {
                Ok(()) => {}
                Err(Some(ConnectionError::Protocol(e @ ProtocolError::LineTooLong { .. }))) => {
                    warn!(error = %e, priority = ?priority, "dropped unsendable line");
                }
                Err(failure) => {
                    // Put the unsent tail back in order, then this line in front.
                    let mut scheduler = shared.scheduler.lock();
                    for (p, l) in batch.rev() {
                        scheduler.requeue(p, l);
                    }
                    scheduler.requeue(priority, line);
                    drop(scheduler);
                    if let Some(e) = failure {
                        shared.fail(generation, e);
                    }
                    break 'ticks;
                }
            }
        }
    }
    debug!("send loop stopped");
}

async fn keepalive_loop(
    shared: Arc<Shared>,
    writer: Writer,
    cancel: CancellationToken,
    generation: u64,
    token: String,
) {
    let timeout = shared.config.timeouts.socket_send;
    let mut interval = tokio::time::interval(shared.config.keepalive.check_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }
        if !shared.flags.registered.load(Ordering::SeqCst) {
            continue;
        }

        let action = shared.keepalive.lock().check(Instant::now());
        match action {
            KeepaliveAction::Idle => {}
            KeepaliveAction::SendPing => {
                let line = slirc_proto::command::ping(&token).line;
                let result = tokio::select! {
                    _ = cancel.cancelled() => break,
                    r = write_line(&writer, &line, timeout) => r,
                };
                if let Err(e) = result {
                    shared.fail(generation, e);
                    break;
                }
            }
            KeepaliveAction::TimedOut => {
                let waited = shared.keepalive.lock().ping_timeout();
                shared.fail(generation, ConnectionError::PingTimeout(waited));
                break;
            }
        }
    }
    debug!("keepalive loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    fn config() -> ClientConfig {
        let mut config = ClientConfig::default();
        config.scheduler.send_delay = Duration::from_millis(5);
        config
    }

    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn test_queued_lines_wait_for_registration() {
        let (listener, port) = listener().await;
        let (conn, _rx) = Connection::new(Arc::new(config()), EventBus::detached(), None);
        conn.connect(&["127.0.0.1".to_string()], port).await.unwrap();
        let (socket, _) = listener.accept().await.unwrap();
        let mut lines = BufReader::new(socket).lines();

        conn.send(slirc_proto::command::privmsg("#a", "queued")).await.unwrap();
        conn.send(slirc_proto::command::nick("me").with_priority(Priority::Critical))
            .await
            .unwrap();
        // Critical goes out before registration; the queued line does not.
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "NICK me");
        assert_eq!(conn.queued(), 1);

        conn.set_registered();
        assert_eq!(
            lines.next_line().await.unwrap().unwrap(),
            "PRIVMSG #a :queued"
        );
        conn.disconnect().await.unwrap();
        assert!(!conn.is_connected());
    }

    #[tokio::test]
    async fn test_critical_requires_connection() {
        let (conn, _rx) = Connection::new(Arc::new(config()), EventBus::detached(), None);
        let err = conn
            .send(slirc_proto::command::pong("x").with_priority(Priority::Critical))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::NotConnected));
        // Queued sends are accepted while offline.
        conn.send(slirc_proto::command::privmsg("#a", "later")).await.unwrap();
        assert_eq!(conn.queued(), 1);
    }

    #[tokio::test]
    async fn test_already_connected_and_not_connected() {
        let (listener, port) = listener().await;
        let (conn, _rx) = Connection::new(Arc::new(config()), EventBus::detached(), None);
        assert!(matches!(
            conn.disconnect().await,
            Err(ConnectionError::NotConnected)
        ));
        conn.connect(&["127.0.0.1".to_string()], port).await.unwrap();
        let _socket = listener.accept().await.unwrap();
        assert!(matches!(
            conn.connect(&["127.0.0.1".to_string()], port).await,
            Err(ConnectionError::AlreadyConnected)
        ));
        conn.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_failover_to_second_address() {
        // The listener is bound to 127.0.0.1 only, so 127.0.0.2 refuses.
        let (listener, port) = listener().await;
        let (conn, _rx) = Connection::new(Arc::new(config()), EventBus::detached(), None);
        let endpoint = conn
            .connect(&["127.0.0.2".to_string(), "127.0.0.1".to_string()], port)
            .await
            .unwrap();
        assert_eq!(endpoint.address, "127.0.0.1");
        let _socket = listener.accept().await.unwrap();
        assert_eq!(conn.endpoint(), Some(endpoint));
        conn.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_retry_limit_exhausts() {
        let (dead, port) = listener().await;
        drop(dead);
        let mut config = config();
        config.retry.auto_retry = true;
        config.retry.auto_retry_limit = 2;
        config.retry.auto_retry_delay = Duration::from_millis(1);

        let (bus, mut events) = EventBus::capture();
        let (conn, _rx) = Connection::new(Arc::new(config), bus, None);
        let err = conn.connect(&["127.0.0.1".to_string()], port).await.unwrap_err();
        assert!(matches!(err, ConnectionError::CouldNotConnect { .. }));

        let mut attempts = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let Event::AutoConnectFailed { attempt } = event {
                attempts.push(attempt);
            }
        }
        assert_eq!(attempts, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_server_close_is_reported() {
        let (listener, port) = listener().await;
        let (conn, mut rx) = Connection::new(Arc::new(config()), EventBus::detached(), None);
        conn.connect(&["127.0.0.1".to_string()], port).await.unwrap();
        let (socket, _) = listener.accept().await.unwrap();
        let mut socket = socket;
        socket.write_all(b":srv NOTICE * :hi\r\n").await.unwrap();
        drop(socket);

        match rx.recv().await.unwrap() {
            Inbound::Line { line, generation } => {
                assert_eq!(line, ":srv NOTICE * :hi");
                assert_eq!(generation, conn.generation());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(rx.recv().await.unwrap(), Inbound::Closed { .. }));
        conn.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_stalled_ping_write_stops_on_cancel() {
        let (listener, port) = listener().await;
        let mut config = config();
        config.keepalive.ping_interval = Duration::from_millis(10);
        config.keepalive.check_interval = Duration::from_millis(5);
        config.timeouts.socket_send = Duration::from_secs(60);
        let (conn, _rx) = Connection::new(Arc::new(config), EventBus::detached(), None);
        conn.connect(&["127.0.0.1".to_string()], port).await.unwrap();
        let _socket = listener.accept().await.unwrap();

        let session = conn.session.lock().take().unwrap();
        // Hold the writer so the ping write cannot make progress.
        let stalled = session.writer.lock().await;
        conn.set_registered();
        tokio::time::sleep(Duration::from_millis(50)).await;

        session.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), session.keepalive)
            .await
            .expect("keepalive loop ignored cancellation")
            .unwrap();
        drop(stalled);
    }

    #[tokio::test]
    async fn test_keepalive_timeout_fails_session() {
        let (listener, port) = listener().await;
        let mut config = config();
        config.keepalive.ping_interval = Duration::from_millis(10);
        config.keepalive.ping_timeout = Duration::from_millis(50);
        config.keepalive.check_interval = Duration::from_millis(5);
        let (conn, mut rx) = Connection::new(Arc::new(config), EventBus::detached(), None);
        conn.connect(&["127.0.0.1".to_string()], port).await.unwrap();
        let (socket, _) = listener.accept().await.unwrap();
        conn.set_registered();

        let mut lines = BufReader::new(socket).lines();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "PING :127.0.0.1");

        match rx.recv().await.unwrap() {
            Inbound::Failed { error, .. } => {
                assert!(matches!(error, ConnectionError::PingTimeout(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(conn.has_error());
        conn.disconnect().await.unwrap();
    }
}
