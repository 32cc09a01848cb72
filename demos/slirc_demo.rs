//! slirc-demo - a minimal logging IRC bot.
//!
//! Usage: `slirc-demo [config.toml] [nickname] [#channel ...]`
//!
//! Connects, registers, joins the given channels and logs every chat line.
//! Set `RUST_LOG=slirc_client=debug` to watch the client internals.

use std::sync::Arc;

use slirc_client::proto::CtcpKind;
use slirc_client::proto::command;
use slirc_client::{Client, ClientConfig, Event, Identity};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "slirc.toml".to_string());
    let nickname = args.next().unwrap_or_else(|| "slirc-demo".to_string());
    let channels: Vec<String> = args.collect();

    let config = ClientConfig::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;
    let client = Client::new(config)?;

    let replier = client.clone();
    client.add_listener(Arc::new(move |event: &Event| -> anyhow::Result<()> {
        match event {
            Event::ChannelMessage { channel, from, text } => {
                info!(channel = %channel, from = %from, "{text}");
            }
            Event::ChannelAction { channel, from, text } => {
                info!(channel = %channel, "* {from} {text}");
            }
            Event::QueryMessage { from, text } => info!(from = %from, "(query) {text}"),
            Event::CtcpRequest {
                from,
                kind: CtcpKind::Version,
                ..
            } => {
                let reply = command::ctcp_reply(from, "VERSION", Some("slirc-demo"));
                let replier = replier.clone();
                tokio::runtime::Handle::current().spawn(async move { replier.send(reply).await });
            }
            Event::ChannelActiveSynced { channel, duration } => {
                info!(channel = %channel, ms = duration.as_millis() as u64, "Channel synced");
            }
            _ => {}
        }
        Ok(())
    }));

    let endpoint = client.connect().await?;
    info!(endpoint = %endpoint, "Connected");
    client.login(Identity::new(nickname)).await?;
    for channel in &channels {
        client.join(channel, None).await?;
    }

    let shutdown = client.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
            if let Err(e) = shutdown.quit(Some("slirc-demo shutting down")).await {
                error!(error = %e, "Failed to send QUIT");
            }
        }
    });

    client.listen().await?;
    info!("Session ended");
    Ok(())
}
