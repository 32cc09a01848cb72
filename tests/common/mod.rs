//! Integration test common infrastructure.
//!
//! Provides a scripted fake IRC server, a client configuration pointed at
//! it, and helpers for waiting on client events.

pub mod server;

use std::time::Duration;

use slirc_client::{ClientConfig, Event};
use tokio::sync::broadcast;
use tokio::time::timeout;

#[allow(unused_imports)]
pub use server::{FakeServer, Peer};

/// A configuration for a client talking to a local fake server, with fast
/// pacing and a keepalive that stays out of the way.
pub fn config(port: u16) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.server.addresses = vec!["127.0.0.1".to_string()];
    config.server.port = port;
    config.scheduler.send_delay = Duration::from_millis(5);
    config
}

/// Wait for the first event matching `predicate`.
#[allow(dead_code)]
pub async fn wait_for<F>(events: &mut broadcast::Receiver<Event>, mut predicate: F) -> Event
where
    F: FnMut(&Event) -> bool,
{
    timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
