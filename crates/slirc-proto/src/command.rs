//! Stateless outbound command formatting.
//!
//! Every builder returns an [`Outgoing`] line tagged with a [`Priority`].
//! Builders default to [`Priority::Medium`]; callers re-tag with
//! [`Outgoing::with_priority`]. Lines never carry the CRLF terminator.
//!
//! ```
//! use slirc_proto::command::{self, Priority};
//!
//! let out = command::privmsg("#rust", "hello").with_priority(Priority::High);
//! assert_eq!(out.line, "PRIVMSG #rust :hello");
//! assert_eq!(out.priority, Priority::High);
//! ```

use std::fmt;

use base64::Engine;

use crate::ctcp::Ctcp;

/// Outbound priority tier.
///
/// The five queued tiers are drained by the scheduler; `Critical` bypasses
/// the queues and is written immediately.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Priority {
    /// Drained only when every higher tier is empty.
    Low,
    /// One per scheduler cycle.
    BelowMedium,
    /// Default tier.
    #[default]
    Medium,
    /// A few per scheduler cycle.
    AboveMedium,
    /// Drained fully every cycle.
    High,
    /// Written synchronously; never queued.
    Critical,
}

impl Priority {
    /// Queued tiers in drain order.
    pub const QUEUED: [Priority; 5] = [
        Priority::High,
        Priority::AboveMedium,
        Priority::Medium,
        Priority::BelowMedium,
        Priority::Low,
    ];
}

/// A formatted line with its priority tier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outgoing {
    /// The line without CRLF.
    pub line: String,
    /// Priority tier.
    pub priority: Priority,
}

impl Outgoing {
    /// Wrap an already formatted line at the default priority.
    pub fn raw(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            priority: Priority::default(),
        }
    }

    /// Re-tag with a different priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

impl fmt::Display for Outgoing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// `PASS password`
pub fn pass(password: &str) -> Outgoing {
    Outgoing::raw(format!("PASS {password}"))
}

/// `NICK nickname`
pub fn nick(nickname: &str) -> Outgoing {
    Outgoing::raw(format!("NICK {nickname}"))
}

/// `USER username usermode * :realname`
pub fn user(username: &str, usermode: &str, realname: &str) -> Outgoing {
    Outgoing::raw(format!("USER {username} {usermode} * :{realname}"))
}

/// `JOIN channel [key]`
pub fn join(channel: &str, key: Option<&str>) -> Outgoing {
    match key {
        Some(key) if !key.is_empty() => Outgoing::raw(format!("JOIN {channel} {key}")),
        _ => Outgoing::raw(format!("JOIN {channel}")),
    }
}

/// `PART channel [:reason]`
pub fn part(channel: &str, reason: Option<&str>) -> Outgoing {
    with_text(format!("PART {channel}"), reason)
}

/// `KICK channel nick [:reason]`
pub fn kick(channel: &str, nickname: &str, reason: Option<&str>) -> Outgoing {
    with_text(format!("KICK {channel} {nickname}"), reason)
}

/// `MODE target [modes]`. Mode parameters are part of `modes`.
pub fn mode(target: &str, modes: Option<&str>) -> Outgoing {
    match modes {
        Some(modes) => Outgoing::raw(format!("MODE {target} {modes}")),
        None => Outgoing::raw(format!("MODE {target}")),
    }
}

/// `MODE channel +b mask`
pub fn ban(channel: &str, mask: &str) -> Outgoing {
    mode(channel, Some(&format!("+b {mask}")))
}

/// `MODE channel -b mask`
pub fn unban(channel: &str, mask: &str) -> Outgoing {
    mode(channel, Some(&format!("-b {mask}")))
}

/// `MODE channel +o nick`
pub fn op(channel: &str, nickname: &str) -> Outgoing {
    mode(channel, Some(&format!("+o {nickname}")))
}

/// `MODE channel -o nick`
pub fn deop(channel: &str, nickname: &str) -> Outgoing {
    mode(channel, Some(&format!("-o {nickname}")))
}

/// `MODE channel +v nick`
pub fn voice(channel: &str, nickname: &str) -> Outgoing {
    mode(channel, Some(&format!("+v {nickname}")))
}

/// `MODE channel -v nick`
pub fn devoice(channel: &str, nickname: &str) -> Outgoing {
    mode(channel, Some(&format!("-v {nickname}")))
}

/// `TOPIC channel [:topic]`. `None` queries the topic.
pub fn topic(channel: &str, topic: Option<&str>) -> Outgoing {
    with_text(format!("TOPIC {channel}"), topic)
}

/// `INVITE nick channel`
pub fn invite(nickname: &str, channel: &str) -> Outgoing {
    Outgoing::raw(format!("INVITE {nickname} {channel}"))
}

/// `WHO mask`
pub fn who(mask: &str) -> Outgoing {
    Outgoing::raw(format!("WHO {mask}"))
}

/// `WHOIS nick`
pub fn whois(nickname: &str) -> Outgoing {
    Outgoing::raw(format!("WHOIS {nickname}"))
}

/// `LIST [channel]`
pub fn list(channel: Option<&str>) -> Outgoing {
    match channel {
        Some(channel) => Outgoing::raw(format!("LIST {channel}")),
        None => Outgoing::raw("LIST"),
    }
}

/// `NAMES channel`
pub fn names(channel: &str) -> Outgoing {
    Outgoing::raw(format!("NAMES {channel}"))
}

/// `PRIVMSG target :text`
pub fn privmsg(target: &str, text: &str) -> Outgoing {
    Outgoing::raw(format!("PRIVMSG {target} :{text}"))
}

/// `NOTICE target :text`
pub fn notice(target: &str, text: &str) -> Outgoing {
    Outgoing::raw(format!("NOTICE {target} :{text}"))
}

/// A CTCP ACTION sent as PRIVMSG.
pub fn action(target: &str, text: &str) -> Outgoing {
    privmsg(target, &Ctcp::encode("ACTION", Some(text)))
}

/// A CTCP request (PRIVMSG).
pub fn ctcp_request(target: &str, command: &str, params: Option<&str>) -> Outgoing {
    privmsg(target, &Ctcp::encode(command, params))
}

/// A CTCP reply (NOTICE).
pub fn ctcp_reply(target: &str, command: &str, params: Option<&str>) -> Outgoing {
    notice(target, &Ctcp::encode(command, params))
}

/// `AWAY [:message]`. `None` clears away state.
pub fn away(message: Option<&str>) -> Outgoing {
    with_text("AWAY".to_owned(), message)
}

/// `QUIT [:reason]`
pub fn quit(reason: Option<&str>) -> Outgoing {
    with_text("QUIT".to_owned(), reason)
}

/// `PING :token`
pub fn ping(token: &str) -> Outgoing {
    Outgoing::raw(format!("PING :{token}"))
}

/// `PONG :token`
pub fn pong(token: &str) -> Outgoing {
    Outgoing::raw(format!("PONG :{token}"))
}

/// `CAP subcommand [:args]`, e.g. `cap("REQ", Some("sasl"))`.
pub fn cap(subcommand: &str, args: Option<&str>) -> Outgoing {
    with_text(format!("CAP {subcommand}"), args)
}

/// `AUTHENTICATE payload`
pub fn authenticate(payload: &str) -> Outgoing {
    Outgoing::raw(format!("AUTHENTICATE {payload}"))
}

/// Maximum SASL payload chunk per AUTHENTICATE line.
pub const SASL_CHUNK: usize = 400;

/// The AUTHENTICATE lines carrying a SASL PLAIN response for `account`.
///
/// The base64 payload is split into 400-byte chunks; a payload that is an
/// exact multiple of 400 ends with `AUTHENTICATE +`.
pub fn authenticate_plain(account: &str, password: &str) -> Vec<Outgoing> {
    let blob = format!("{account}\0{account}\0{password}");
    let encoded = base64::engine::general_purpose::STANDARD.encode(blob);

    let mut lines: Vec<Outgoing> = encoded
        .as_bytes()
        .chunks(SASL_CHUNK)
        .map(|chunk| authenticate(&String::from_utf8_lossy(chunk)))
        .collect();
    if encoded.len() % SASL_CHUNK == 0 {
        lines.push(authenticate("+"));
    }
    lines
}

fn with_text(head: String, text: Option<&str>) -> Outgoing {
    match text {
        Some(text) => Outgoing::raw(format!("{head} :{text}")),
        None => Outgoing::raw(head),
    }
}
