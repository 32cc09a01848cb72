//! Registration: PASS/NICK/USER, nickname collisions and SASL PLAIN.

use rand::Rng;
use slirc_proto::{IrcMessage, Outgoing, Priority, command};
use tracing::{debug, info, warn};

use super::{SyncOutput, Synchronizer};
use crate::config::{Identity, SaslCredentials};
use crate::event::Event;

/// Nicknames longer than this are cut before a random suffix is added.
const NICK_STEM_LEN: usize = 5;

/// Progress of the current login.
#[derive(Debug, Default)]
pub struct LoginState {
    candidates: Vec<String>,
    index: usize,
    current: Option<String>,
    sasl: Option<SaslCredentials>,
    registered: bool,
}

impl LoginState {
    /// The nickname most recently sent with NICK.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub(super) fn set_current(&mut self, nick: &str) {
        self.current = Some(nick.to_owned());
    }

    pub(super) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance to the next nickname after a collision.
    ///
    /// Candidates are tried in order. Once they run out, the current
    /// nickname is cut down and given a random numeric suffix, as many
    /// times as needed.
    fn next_nickname(&mut self) -> String {
        let next = if self.index + 1 < self.candidates.len() {
            self.index += 1;
            self.candidates[self.index].clone()
        } else {
            let current = self.current.as_deref().unwrap_or_default();
            let len = current.chars().count();
            let stem: String = if len > NICK_STEM_LEN {
                current.chars().take(NICK_STEM_LEN).collect()
            } else {
                current.chars().take(len.saturating_sub(1)).collect()
            };
            let stem = if stem.is_empty() { "_".to_owned() } else { stem };
            format!("{stem}{}", rand::thread_rng().gen_range(0..1000))
        };
        self.current = Some(next.clone());
        next
    }
}

impl Synchronizer {
    /// Lines that register `identity`, all at Critical priority.
    pub fn begin_login(&mut self, identity: &Identity) -> Vec<Outgoing> {
        self.login = LoginState {
            candidates: identity.nicknames.clone(),
            index: 0,
            current: identity.primary_nickname().map(str::to_owned),
            sasl: identity.sasl.clone(),
            registered: false,
        };

        let mut lines = Vec::with_capacity(4);
        if let Some(password) = &identity.password {
            lines.push(command::pass(password));
        }
        if identity.sasl.is_some() {
            lines.push(command::cap("REQ", Some("sasl")));
        }
        if let Some(nick) = &self.login.current {
            lines.push(command::nick(nick));
        }
        lines.push(command::user(
            &identity.username,
            &identity.usermode,
            &identity.realname,
        ));
        lines
            .into_iter()
            .map(|l| l.with_priority(Priority::Critical))
            .collect()
    }

    pub fn login(&self) -> &LoginState {
        &self.login
    }

    pub(super) fn on_welcome(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let nickname = msg
            .param(0)
            .map(str::to_owned)
            .or_else(|| self.login.current.clone())
            .unwrap_or_default();
        info!(nickname = %nickname, "registered");
        self.login.registered = true;
        self.login.current = Some(nickname.clone());
        self.model.set_me(&nickname);
        out.registered = true;
        out.emit(Event::Registered { nickname });
    }

    pub(super) fn on_nick_rejected(&mut self, out: &mut SyncOutput) {
        if self.login.registered || !self.config.auto_nick_handling {
            return;
        }
        let rejected = self.login.current.clone().unwrap_or_default();
        let next = self.login.next_nickname();
        warn!(rejected = %rejected, next = %next, "nickname rejected, trying another");
        out.send(command::nick(&next), Priority::Critical);
    }

    pub(super) fn on_cap(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let sub = msg.param(1).unwrap_or_default();
        let caps = msg.text().unwrap_or_default();
        let has_sasl = caps.split_whitespace().any(|c| c.eq_ignore_ascii_case("sasl"));
        match sub {
            "ACK" if has_sasl && self.login.sasl.is_some() => {
                debug!("sasl acknowledged");
                out.send(command::authenticate("PLAIN"), Priority::Critical);
            }
            "NAK" if has_sasl => {
                warn!("server refused sasl");
                out.send(command::cap("END", None), Priority::Critical);
                out.emit(Event::SaslResult { success: false });
            }
            _ => {}
        }
    }

    pub(super) fn on_authenticate(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        if msg.param(0) != Some("+") {
            return;
        }
        let Some(creds) = &self.login.sasl else {
            return;
        };
        for line in command::authenticate_plain(&creds.account, &creds.password) {
            out.send(line, Priority::Critical);
        }
    }

    pub(super) fn on_sasl_done(&mut self, success: bool, out: &mut SyncOutput) {
        if self.login.sasl.is_none() || self.login.registered {
            return;
        }
        if success {
            info!("sasl authentication succeeded");
        } else {
            warn!("sasl authentication failed");
        }
        out.send(command::cap("END", None), Priority::Critical);
        out.emit(Event::SaslResult { success });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_then_random_suffix() {
        let mut login = LoginState {
            candidates: vec!["alice".into(), "alice_".into(), "alice__".into()],
            current: Some("alice".into()),
            ..LoginState::default()
        };
        assert_eq!(login.next_nickname(), "alice_");
        assert_eq!(login.next_nickname(), "alice__");

        let random = login.next_nickname();
        let suffix = random.strip_prefix("alice").unwrap();
        assert!(!suffix.is_empty() && suffix.len() <= 3, "{random}");
        assert!(suffix.parse::<u16>().unwrap() < 1000);
    }

    #[test]
    fn test_short_nick_drops_last_char() {
        let mut login = LoginState {
            candidates: vec!["bob".into()],
            current: Some("bob".into()),
            ..LoginState::default()
        };
        let next = login.next_nickname();
        assert!(next.starts_with("bo"), "{next}");
        assert!(next[2..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_begin_login_lines() {
        let mut sync = Synchronizer::new(Default::default());
        let identity = Identity::new("alice").with_sasl("alice", "pw");
        let lines: Vec<String> = sync
            .begin_login(&identity)
            .into_iter()
            .inspect(|l| assert_eq!(l.priority, Priority::Critical))
            .map(|l| l.line)
            .collect();
        assert_eq!(
            lines,
            vec!["CAP REQ :sasl", "NICK alice", "USER alice 0 * :alice"]
        );
        assert_eq!(sync.nickname(), Some("alice"));
    }
}
