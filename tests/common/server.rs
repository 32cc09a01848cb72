//! Scripted fake IRC server.
//!
//! Each test drives the server side by hand: accept a connection, read the
//! lines the client sends, and write back whatever the scenario needs.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// A listening fake server on a random local port.
pub struct FakeServer {
    listener: TcpListener,
    port: u16,
}

impl FakeServer {
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Accept the next client connection.
    pub async fn accept(&self) -> anyhow::Result<Peer> {
        let (stream, _) = timeout(Duration::from_secs(5), self.listener.accept()).await??;
        let (read_half, write_half) = stream.into_split();
        Ok(Peer {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        })
    }
}

/// The server side of one client connection.
pub struct Peer {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl Peer {
    /// Send a raw line; CRLF is added.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive one line from the client.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive one line with a timeout.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let read = timeout(dur, self.reader.read_line(&mut line)).await??;
        if read == 0 {
            anyhow::bail!("client closed the connection");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Receive lines until one satisfies `predicate`, returning it.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<String>
    where
        F: FnMut(&str) -> bool,
    {
        loop {
            let line = self.recv().await?;
            if predicate(&line) {
                return Ok(line);
            }
        }
    }

    /// Read the NICK/USER registration burst and welcome `nick`.
    #[allow(dead_code)]
    pub async fn register(&mut self, nick: &str) -> anyhow::Result<()> {
        self.recv_until(|l| l.starts_with("USER ")).await?;
        self.send(&format!(":irc.test 001 {nick} :Welcome to the test network"))
            .await
    }
}
