//! Semantic classification of inbound messages.
//!
//! Classification is a pure function of the numeric code (or command word)
//! and the shape of the parameters. The channel name, when a kind carries
//! one, is read from a fixed parameter position.

use crate::ctcp::Ctcp;
use crate::reply::ReplyCode;

/// Characters that open a channel name.
pub const CHANNEL_PREFIXES: [char; 4] = ['#', '&', '!', '+'];

/// Whether `name` starts with a channel prefix.
pub fn is_channel_name(name: &str) -> bool {
    name.starts_with(CHANNEL_PREFIXES)
}

/// What an inbound message means to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum MessageKind {
    /// Nothing more specific applies.
    Unknown,
    /// Registration replies (001-004).
    Login,
    /// Server statistics (LUSERS block).
    Info,
    /// Message of the day.
    Motd,
    /// Name-list reply or its end.
    Name,
    /// WHO reply or its end.
    Who,
    /// LIST reply block.
    List,
    /// Ban-list entry or its end.
    BanList,
    /// Topic reply (331/332).
    Topic,
    /// WHOIS reply block.
    WhoIs,
    /// WHOWAS reply block.
    WhoWas,
    /// Own user-mode reply (221).
    UserMode,
    /// Channel mode reply (324).
    ChannelMode,
    /// Away state replies (301/305/306).
    Away,
    /// Any numeric in the 400-599 range.
    ErrorMessage,
    /// `ERROR` from the server.
    Error,
    /// `PING` probe.
    Ping,
    /// `PONG` reply.
    Pong,
    /// Someone joined a channel.
    Join,
    /// Someone left a channel.
    Part,
    /// Someone was kicked.
    Kick,
    /// Someone quit IRC.
    Quit,
    /// Someone changed nickname.
    NickChange,
    /// A channel topic changed.
    TopicChange,
    /// We were invited.
    Invite,
    /// MODE on a nickname.
    UserModeChange,
    /// MODE on a channel.
    ChannelModeChange,
    /// PRIVMSG to a channel.
    ChannelMessage,
    /// CTCP ACTION to a channel.
    ChannelAction,
    /// NOTICE to a channel.
    ChannelNotice,
    /// PRIVMSG to us.
    QueryMessage,
    /// CTCP ACTION to us.
    QueryAction,
    /// NOTICE to us.
    QueryNotice,
    /// Any non-ACTION CTCP inside a PRIVMSG.
    CtcpRequest,
    /// Any non-ACTION CTCP inside a NOTICE.
    CtcpReply,
}

/// Classify a message.
///
/// `params` are the positional arguments followed by the trailing payload
/// when present.
pub fn classify(reply: Option<ReplyCode>, command: &str, params: &[&str]) -> MessageKind {
    match reply {
        Some(code) => classify_numeric(code),
        None => classify_command(command, params),
    }
}

fn classify_numeric(code: ReplyCode) -> MessageKind {
    match code.code() {
        1..=4 => MessageKind::Login,
        251..=255 | 265 | 266 => MessageKind::Info,
        372 | 375 | 376 => MessageKind::Motd,
        353 | 366 => MessageKind::Name,
        352 | 315 => MessageKind::Who,
        321..=323 => MessageKind::List,
        367 | 368 => MessageKind::BanList,
        331 | 332 => MessageKind::Topic,
        311..=313 | 317..=319 => MessageKind::WhoIs,
        314 | 369 => MessageKind::WhoWas,
        221 => MessageKind::UserMode,
        324 => MessageKind::ChannelMode,
        301 | 305 | 306 => MessageKind::Away,
        400..=599 => MessageKind::ErrorMessage,
        _ => MessageKind::Unknown,
    }
}

fn classify_command(command: &str, params: &[&str]) -> MessageKind {
    let target = params.first().copied().unwrap_or_default();
    match command {
        "PING" => MessageKind::Ping,
        "PONG" => MessageKind::Pong,
        "ERROR" => MessageKind::Error,
        "JOIN" => MessageKind::Join,
        "PART" => MessageKind::Part,
        "KICK" => MessageKind::Kick,
        "QUIT" => MessageKind::Quit,
        "NICK" => MessageKind::NickChange,
        "TOPIC" => MessageKind::TopicChange,
        "INVITE" => MessageKind::Invite,
        "MODE" if is_channel_name(target) => MessageKind::ChannelModeChange,
        "MODE" => MessageKind::UserModeChange,
        "PRIVMSG" | "NOTICE" => {
            let notice = command == "NOTICE";
            let channel = is_channel_name(target);
            let text = if params.len() > 1 {
                params[params.len() - 1]
            } else {
                ""
            };

            if Ctcp::is_ctcp(text) {
                match (Ctcp::is_action(text), channel, notice) {
                    (true, true, _) => MessageKind::ChannelAction,
                    (true, false, _) => MessageKind::QueryAction,
                    (false, _, false) => MessageKind::CtcpRequest,
                    (false, _, true) => MessageKind::CtcpReply,
                }
            } else {
                match (channel, notice) {
                    (true, false) => MessageKind::ChannelMessage,
                    (true, true) => MessageKind::ChannelNotice,
                    (false, false) => MessageKind::QueryMessage,
                    (false, true) => MessageKind::QueryNotice,
                }
            }
        }
        _ => MessageKind::Unknown,
    }
}

/// The parameter index carrying the channel name for `kind`, if any.
///
/// The end-of-names (366) and no-channel-modes (477) replies carry the
/// channel one position earlier than the name-list reply.
pub fn channel_position(kind: MessageKind, reply: Option<ReplyCode>) -> Option<usize> {
    match (kind, reply) {
        (_, Some(ReplyCode::RPL_ENDOFNAMES)) | (_, Some(ReplyCode::ERR_NOCHANMODES)) => Some(1),
        (MessageKind::Name, _) => Some(2),
        (
            MessageKind::Join
            | MessageKind::Part
            | MessageKind::Kick
            | MessageKind::TopicChange
            | MessageKind::ChannelModeChange
            | MessageKind::ChannelMessage
            | MessageKind::ChannelAction
            | MessageKind::ChannelNotice,
            _,
        ) => Some(0),
        (
            MessageKind::Who
            | MessageKind::Topic
            | MessageKind::Invite
            | MessageKind::BanList
            | MessageKind::ChannelMode,
            _,
        ) => Some(1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(command: &str, params: &[&str]) -> MessageKind {
        classify(None, command, params)
    }

    #[test]
    fn test_numeric_buckets() {
        let cases = [
            (1, MessageKind::Login),
            (4, MessageKind::Login),
            (5, MessageKind::Unknown),
            (251, MessageKind::Info),
            (266, MessageKind::Info),
            (375, MessageKind::Motd),
            (353, MessageKind::Name),
            (366, MessageKind::Name),
            (352, MessageKind::Who),
            (322, MessageKind::List),
            (367, MessageKind::BanList),
            (332, MessageKind::Topic),
            (318, MessageKind::WhoIs),
            (314, MessageKind::WhoWas),
            (221, MessageKind::UserMode),
            (324, MessageKind::ChannelMode),
            (433, MessageKind::ErrorMessage),
            (599, MessageKind::ErrorMessage),
            (600, MessageKind::Unknown),
        ];
        for (code, kind) in cases {
            assert_eq!(classify(Some(ReplyCode(code)), "", &[]), kind, "code {code}");
        }
    }

    #[test]
    fn test_mode_split_by_target() {
        assert_eq!(cmd("MODE", &["#chan", "+o", "bob"]), MessageKind::ChannelModeChange);
        assert_eq!(cmd("MODE", &["bob", "+i"]), MessageKind::UserModeChange);
    }

    #[test]
    fn test_message_split() {
        assert_eq!(cmd("PRIVMSG", &["#chan", "hi"]), MessageKind::ChannelMessage);
        assert_eq!(cmd("PRIVMSG", &["&local", "hi"]), MessageKind::ChannelMessage);
        assert_eq!(cmd("PRIVMSG", &["me", "hi"]), MessageKind::QueryMessage);
        assert_eq!(cmd("NOTICE", &["#chan", "hi"]), MessageKind::ChannelNotice);
        assert_eq!(cmd("NOTICE", &["me", "hi"]), MessageKind::QueryNotice);
    }

    #[test]
    fn test_ctcp_split() {
        assert_eq!(
            cmd("PRIVMSG", &["#chan", "\x01ACTION waves\x01"]),
            MessageKind::ChannelAction
        );
        assert_eq!(
            cmd("PRIVMSG", &["me", "\x01ACTION waves\x01"]),
            MessageKind::QueryAction
        );
        assert_eq!(cmd("PRIVMSG", &["me", "\x01VERSION\x01"]), MessageKind::CtcpRequest);
        assert_eq!(
            cmd("NOTICE", &["me", "\x01VERSION slirc\x01"]),
            MessageKind::CtcpReply
        );
    }

    #[test]
    fn test_channel_positions() {
        assert_eq!(channel_position(MessageKind::Join, None), Some(0));
        assert_eq!(
            channel_position(MessageKind::Name, Some(ReplyCode::RPL_NAMREPLY)),
            Some(2)
        );
        assert_eq!(
            channel_position(MessageKind::Name, Some(ReplyCode::RPL_ENDOFNAMES)),
            Some(1)
        );
        assert_eq!(
            channel_position(MessageKind::ErrorMessage, Some(ReplyCode::ERR_NOCHANMODES)),
            Some(1)
        );
        assert_eq!(
            channel_position(MessageKind::ErrorMessage, Some(ReplyCode::ERR_NICKNAMEINUSE)),
            None
        );
        assert_eq!(channel_position(MessageKind::QueryMessage, None), None);
    }

    #[test]
    fn test_is_channel_name() {
        for name in ["#a", "&a", "!a", "+a"] {
            assert!(is_channel_name(name));
        }
        assert!(!is_channel_name("nick"));
        assert!(!is_channel_name(""));
    }
}
