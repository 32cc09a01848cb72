//! Asynchronous event delivery.
//!
//! The processing context hands events to [`EventBus::emit`], which never
//! blocks. A single dispatcher task forwards each event to the broadcast
//! channel and then runs the registered [`Listener`]s for it on the
//! blocking worker pool, one event at a time, so a slow listener delays
//! later notifications but never protocol processing. Listener errors and
//! panics are logged and swallowed.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};
use tracing::{trace, warn};

use crate::event::Event;

/// A subscriber callback.
pub type Listener = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>;

/// Capacity of the broadcast channel returned by `Client::subscribe`.
pub const BROADCAST_CAPACITY: usize = 1024;

/// Registered listeners, shared between the client and the dispatcher.
pub type Listeners = Arc<RwLock<Vec<Listener>>>;

/// Sending side of the dispatcher.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventBus {
    /// Start the dispatcher task on the current runtime.
    pub fn spawn(listeners: Listeners, broadcast: broadcast::Sender<Event>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx, listeners, broadcast));
        Self { tx }
    }

    /// A bus that drops everything.
    pub fn detached() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }

    /// A bus whose events are collected on the returned receiver.
    #[cfg(test)]
    pub(crate) fn capture() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: Event) {
        trace!(?event, "emit");
        // Receiver gone means the client is shutting down.
        let _ = self.tx.send(event);
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Event>,
    listeners: Listeners,
    broadcast: broadcast::Sender<Event>,
) {
    while let Some(event) = rx.recv().await {
        // No subscribers is not an error.
        let _ = broadcast.send(event.clone());

        let current: Vec<Listener> = listeners.read().clone();
        if current.is_empty() {
            continue;
        }
        let delivered = tokio::task::spawn_blocking(move || {
            for listener in &current {
                deliver(listener, &event);
            }
        })
        .await;
        if let Err(e) = delivered {
            warn!(error = %e, "listener worker failed");
        }
    }
}

fn deliver(listener: &Listener, event: &Event) {
    match catch_unwind(AssertUnwindSafe(|| listener(event))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "listener returned an error"),
        Err(_) => warn!("listener panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn bus() -> (EventBus, Listeners, broadcast::Receiver<Event>) {
        let listeners: Listeners = Arc::default();
        let (tx, rx) = broadcast::channel(16);
        (EventBus::spawn(Arc::clone(&listeners), tx), listeners, rx)
    }

    #[tokio::test]
    async fn test_broadcast_preserves_order() {
        let (bus, _listeners, mut rx) = bus();
        bus.emit(Event::Disconnecting);
        bus.emit(Event::Disconnected);
        assert!(matches!(rx.recv().await.unwrap(), Event::Disconnecting));
        assert!(matches!(rx.recv().await.unwrap(), Event::Disconnected));
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_stop_others() {
        let (bus, listeners, mut rx) = bus();
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        listeners
            .write()
            .push(Arc::new(|_: &Event| -> anyhow::Result<()> { anyhow::bail!("boom") }));
        listeners
            .write()
            .push(Arc::new(|_: &Event| -> anyhow::Result<()> { panic!("listener panic") }));
        listeners.write().push(Arc::new(move |event: &Event| -> anyhow::Result<()> {
            seen_tx.send(format!("{event:?}"))?;
            Ok(())
        }));

        bus.emit(Event::Unaway);
        bus.emit(Event::NowAway);
        let first = tokio::time::timeout(Duration::from_secs(5), seen_rx.recv())
            .await
            .unwrap()
            .unwrap();
        let second = seen_rx.recv().await.unwrap();
        assert_eq!(first, "Unaway");
        assert_eq!(second, "NowAway");
        assert!(matches!(rx.recv().await.unwrap(), Event::Unaway));
    }
}
