//! slirc-client - Straylight IRC client library
//!
//! An async IRC client core: a prioritized outbound scheduler with
//! keepalive over plain or TLS sockets, and an opt-in live model of the
//! channels and users the client can see.
//!
//! ```no_run
//! use slirc_client::{Client, ClientConfig, Event, Identity};
//!
//! # async fn run() -> slirc_client::Result<()> {
//! let config = ClientConfig::from_toml_str(
//!     r#"
//! [server]
//! addresses = ["irc.libera.chat"]
//! port = 6697
//!
//! [tls]
//! enabled = true
//! "#,
//! )?;
//! let client = Client::new(config)?;
//! let mut events = client.subscribe();
//!
//! client.connect().await?;
//! client.login(Identity::new("slirc")).await?;
//! client.join("#slirc", None).await?;
//!
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if let Event::ChannelMessage { channel, from, text } = event {
//!             println!("[{channel}] <{from}> {text}");
//!         }
//!     }
//! });
//! client.listen().await
//! # }
//! ```

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
mod fetch;
pub mod network;
pub mod state;
pub mod sync;
pub mod telemetry;

pub use client::Client;
pub use config::{ClientConfig, Identity};
pub use dispatch::Listener;
pub use error::{ClientError, ConnectionError, Result};
pub use event::Event;
pub use network::ProxyConnector;

/// Re-export of the protocol crate.
pub use slirc_proto as proto;
