//! Tracing helpers.
//!
//! The library never installs a subscriber; applications choose their own
//! (the demo binary uses `tracing-subscriber` with `RUST_LOG` filtering).

use std::time::Instant;

use tracing::debug;

/// Guard that logs how long a labelled operation took when dropped.
pub struct OpTimer {
    label: &'static str,
    start: Instant,
}

impl OpTimer {
    /// Start timing an operation.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for OpTimer {
    fn drop(&mut self) {
        debug!(
            op = self.label,
            elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0,
            "operation finished"
        );
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span wrapping the background loops of one connection.
    pub fn connection(address: &str, port: u16) -> Span {
        info_span!("connection", address = %address, port = port)
    }

    /// Span for state transitions of one channel.
    pub fn channel(name: &str) -> Span {
        info_span!("channel", name = %name)
    }

    /// Span for processing one inbound line.
    pub fn inbound(command: &str) -> Span {
        tracing::trace_span!("inbound", command = %command)
    }
}
