//! Keepalive probing and lag measurement.
//!
//! The keepalive loop calls [`Keepalive::check`] every check interval. When
//! the link has been quiet for a ping interval a PING goes out at Critical
//! priority; if no PONG follows within the timeout the connection is treated
//! as failed.

use std::time::{Duration, Instant};

use crate::config::KeepaliveConfig;

/// What the keepalive loop should do after a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveAction {
    /// Nothing is due.
    Idle,
    /// Send a PING now.
    SendPing,
    /// The outstanding PING went unanswered.
    TimedOut,
}

#[derive(Debug)]
pub struct Keepalive {
    ping_interval: Duration,
    ping_timeout: Duration,
    last_pong: Instant,
    ping_sent: Option<Instant>,
    lag: Duration,
}

impl Keepalive {
    pub fn new(config: &KeepaliveConfig, now: Instant) -> Self {
        Self {
            ping_interval: config.ping_interval,
            ping_timeout: config.ping_timeout,
            last_pong: now,
            ping_sent: None,
            lag: Duration::ZERO,
        }
    }

    /// Start over for a fresh session.
    pub fn reset(&mut self, now: Instant) {
        self.last_pong = now;
        self.ping_sent = None;
        self.lag = Duration::ZERO;
    }

    /// Decide what to do at `now`. Returning `SendPing` marks a probe as
    /// outstanding.
    pub fn check(&mut self, now: Instant) -> KeepaliveAction {
        if let Some(sent) = self.ping_sent {
            if now.saturating_duration_since(sent) >= self.ping_timeout {
                return KeepaliveAction::TimedOut;
            }
            return KeepaliveAction::Idle;
        }

        if now.saturating_duration_since(self.last_pong) >= self.ping_interval {
            self.ping_sent = Some(now);
            return KeepaliveAction::SendPing;
        }
        KeepaliveAction::Idle
    }

    /// Record a PONG from the server.
    pub fn on_pong(&mut self, now: Instant) {
        if let Some(sent) = self.ping_sent.take() {
            self.lag = now.saturating_duration_since(sent);
        }
        self.last_pong = now;
    }

    /// Round-trip time of the last probe, or the time the current probe has
    /// been outstanding if that is longer.
    pub fn lag(&self, now: Instant) -> Duration {
        match self.ping_sent {
            Some(sent) => self.lag.max(now.saturating_duration_since(sent)),
            None => self.lag,
        }
    }

    /// Whether a probe is waiting for its PONG.
    pub fn awaiting_pong(&self) -> bool {
        self.ping_sent.is_some()
    }

    pub fn ping_timeout(&self) -> Duration {
        self.ping_timeout
    }
}
