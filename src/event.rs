//! Notifications emitted by the client.
//!
//! One [`Event`] is emitted per protocol occurrence, in the order the
//! synchronizer produced them. Every inbound line is additionally emitted
//! as [`Event::Raw`] before its typed event.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use slirc_proto::{CtcpKind, IrcMessage, ReplyCode};

use crate::error::ConnectionError;
use crate::state::Role;

/// A protocol occurrence.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Event {
    // Connection lifecycle
    Connecting { address: String, port: u16 },
    Connected { address: String, port: u16 },
    Disconnecting,
    Disconnected,
    /// The session failed mid-flight.
    ConnectionError(Arc<ConnectionError>),
    /// Every candidate address failed once more.
    AutoConnectFailed { attempt: u32 },
    /// Login completed (001).
    Registered { nickname: String },
    /// Every inbound line, before any typed event.
    Raw(Arc<IrcMessage>),

    // Server control
    Ping { token: String },
    Pong { lag: Duration },
    /// `ERROR` from the server.
    Error { message: String },
    /// A numeric in the 400-599 range.
    ErrorMessage { code: ReplyCode, text: String },
    Motd { line: String },
    SaslResult { success: bool },

    // Membership
    Join { channel: String, nick: String },
    Part { channel: String, nick: String, reason: Option<String> },
    Kick { channel: String, by: String, target: String, reason: Option<String> },
    Quit { nick: String, reason: Option<String> },
    NickChange { old: String, new: String },
    /// One name-list reply, prefixes included.
    Names { channel: String, names: Vec<String> },
    Invite { channel: String, by: String },

    // Lists
    ListItem(ChannelInfo),
    ListEnd,
    Who(WhoInfo),
    WhoEnd { mask: String },
    BanListEntry(BanInfo),
    BanListEnd { channel: String },

    // Topic and modes
    Topic { channel: String, topic: Option<String> },
    TopicChange { channel: String, by: String, topic: String },
    UserModeChange { modes: String },
    ChannelModeChange { channel: String, by: String, modes: String },
    /// Full mode reply (324).
    ChannelMode { channel: String, modes: String },
    RoleChange { channel: String, by: String, target: String, role: Role, granted: bool },
    Ban { channel: String, by: String, mask: String, added: bool },

    // Messages
    ChannelMessage { channel: String, from: String, text: String },
    ChannelAction { channel: String, from: String, text: String },
    ChannelNotice { channel: String, from: String, text: String },
    QueryMessage { from: String, text: String },
    QueryAction { from: String, text: String },
    QueryNotice { from: String, text: String },
    CtcpRequest { from: String, target: String, kind: CtcpKind, params: Option<String> },
    CtcpReply { from: String, target: String, kind: CtcpKind, params: Option<String> },

    // Away
    Away { nick: String, message: String },
    Unaway,
    NowAway,

    // Synchronization
    /// Ban list or no-modes reply closed the join bootstrap.
    ChannelActiveSynced { channel: String, duration: Duration },
    /// End of the name list.
    ChannelPassiveSynced { channel: String },
}

/// One entry of a LIST reply (322).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub channel: String,
    pub user_count: u32,
    pub topic: String,
}

impl ChannelInfo {
    pub fn from_message(msg: &IrcMessage) -> Option<Self> {
        Some(Self {
            channel: msg.arg(1)?.to_owned(),
            user_count: msg.arg(2).and_then(|n| n.parse().ok()).unwrap_or(0),
            topic: msg.trailing().unwrap_or_default().to_owned(),
        })
    }
}

/// One WHO reply (352).
///
/// Layout: `352 me channel ident host server nick flags :hops realname`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhoInfo {
    pub channel: String,
    pub ident: String,
    pub host: String,
    pub server: String,
    pub nick: String,
    /// `G` flag.
    pub away: bool,
    /// `*` flag.
    pub oper: bool,
    /// `@` flag.
    pub op: bool,
    /// `+` flag.
    pub voice: bool,
    /// `%` flag.
    pub halfop: bool,
    /// `&` flag.
    pub admin: bool,
    /// `~` flag.
    pub owner: bool,
    /// `r` flag.
    pub registered: bool,
    pub hop_count: u32,
    pub realname: String,
}

impl WhoInfo {
    pub fn from_message(msg: &IrcMessage) -> Option<Self> {
        let flags = msg.arg(6).unwrap_or_default();
        let (hops, realname) = match msg.trailing() {
            Some(t) => t.split_once(' ').unwrap_or((t, "")),
            None => ("0", ""),
        };
        Some(Self {
            channel: msg.arg(1)?.to_owned(),
            ident: msg.arg(2)?.to_owned(),
            host: msg.arg(3)?.to_owned(),
            server: msg.arg(4)?.to_owned(),
            nick: msg.arg(5)?.to_owned(),
            away: flags.contains('G'),
            oper: flags.contains('*'),
            op: flags.contains('@'),
            voice: flags.contains('+'),
            halfop: flags.contains('%'),
            admin: flags.contains('&'),
            owner: flags.contains('~'),
            registered: flags.contains('r'),
            hop_count: hops.parse().unwrap_or(0),
            realname: realname.to_owned(),
        })
    }
}

/// One ban-list entry (367).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanInfo {
    pub channel: String,
    pub mask: String,
    pub set_by: Option<String>,
    pub set_at: Option<DateTime<Utc>>,
}

impl BanInfo {
    pub fn from_message(msg: &IrcMessage) -> Option<Self> {
        let set_at = msg
            .param(4)
            .and_then(|ts| ts.parse::<i64>().ok())
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single());
        Some(Self {
            channel: msg.param(1)?.to_owned(),
            mask: msg.param(2)?.to_owned(),
            set_by: msg.param(3).map(str::to_owned),
            set_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> IrcMessage {
        IrcMessage::parse(line).unwrap()
    }

    #[test]
    fn test_who_info() {
        let msg = parse(":srv 352 me #rust al host.example srv.example alice G*@ :2 Alice Liddell");
        let who = WhoInfo::from_message(&msg).unwrap();
        assert_eq!(who.channel, "#rust");
        assert_eq!(who.nick, "alice");
        assert_eq!(who.ident, "al");
        assert!(who.away && who.oper && who.op);
        assert!(!who.voice);
        assert_eq!(who.hop_count, 2);
        assert_eq!(who.realname, "Alice Liddell");
    }

    #[test]
    fn test_who_info_short_reply() {
        let msg = parse(":srv 352 me #rust al host");
        assert!(WhoInfo::from_message(&msg).is_none());
    }

    #[test]
    fn test_channel_info() {
        let msg = parse(":srv 322 me #rust 42 :Systems programming");
        let info = ChannelInfo::from_message(&msg).unwrap();
        assert_eq!(info.channel, "#rust");
        assert_eq!(info.user_count, 42);
        assert_eq!(info.topic, "Systems programming");
    }

    #[test]
    fn test_ban_info() {
        let msg = parse(":srv 367 me #rust *!*@spam op 1700000000");
        let ban = BanInfo::from_message(&msg).unwrap();
        assert_eq!(ban.mask, "*!*@spam");
        assert_eq!(ban.set_by.as_deref(), Some("op"));
        assert_eq!(ban.set_at.map(|t| t.timestamp()), Some(1_700_000_000));

        let bare = BanInfo::from_message(&parse(":srv 367 me #rust *!*@spam")).unwrap();
        assert_eq!(bare.set_by, None);
        assert_eq!(bare.set_at, None);
    }
}
