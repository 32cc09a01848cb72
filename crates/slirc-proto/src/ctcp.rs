//! CTCP envelopes carried inside PRIVMSG and NOTICE payloads.
//!
//! A CTCP payload is wrapped in `\x01` markers: `\x01COMMAND params\x01`.
//! Servers and some clients drop the closing marker, so it is optional when
//! parsing.
//!
//! ```
//! use slirc_proto::ctcp::{Ctcp, CtcpKind};
//!
//! let ctcp = Ctcp::parse("\x01ACTION waves hello\x01").unwrap();
//! assert_eq!(ctcp.kind, CtcpKind::Action);
//! assert_eq!(ctcp.params, Some("waves hello"));
//!
//! assert_eq!(Ctcp::encode("VERSION", None), "\x01VERSION\x01");
//! ```

use std::fmt;

/// The CTCP envelope marker.
pub const CTCP_MARKER: char = '\x01';

/// CTCP commands the client distinguishes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CtcpKind {
    /// `/me` style action.
    Action,
    /// Client version query.
    Version,
    /// Round-trip probe between clients.
    Ping,
    /// Local time query.
    Time,
    /// Supported-commands query.
    Clientinfo,
    /// Peer-to-peer transfer negotiation, handled by an external extension.
    Dcc,
    /// Any other command, kept verbatim.
    Other(String),
}

impl CtcpKind {
    /// Map a command word (case-insensitive) to its kind.
    pub fn from_command(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "ACTION" => Self::Action,
            "VERSION" => Self::Version,
            "PING" => Self::Ping,
            "TIME" => Self::Time,
            "CLIENTINFO" => Self::Clientinfo,
            "DCC" => Self::Dcc,
            _ => Self::Other(name.to_owned()),
        }
    }

    /// The command word as sent on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Action => "ACTION",
            Self::Version => "VERSION",
            Self::Ping => "PING",
            Self::Time => "TIME",
            Self::Clientinfo => "CLIENTINFO",
            Self::Dcc => "DCC",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for CtcpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CTCP payload borrowed from a message body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctcp<'a> {
    /// Command kind.
    pub kind: CtcpKind,
    /// Everything after the command word, if non-empty.
    pub params: Option<&'a str>,
}

impl<'a> Ctcp<'a> {
    /// Parse a message body. Returns `None` unless it opens with the marker
    /// and carries a command word.
    pub fn parse(text: &'a str) -> Option<Self> {
        let inner = text.strip_prefix(CTCP_MARKER)?;
        let inner = inner.strip_suffix(CTCP_MARKER).unwrap_or(inner);

        let (command, params) = match inner.split_once(' ') {
            Some((command, rest)) => (command, Some(rest).filter(|p| !p.is_empty())),
            None => (inner, None),
        };
        if command.is_empty() {
            return None;
        }

        Some(Self {
            kind: CtcpKind::from_command(command),
            params,
        })
    }

    /// Whether a message body is a CTCP envelope.
    #[inline]
    pub fn is_ctcp(text: &str) -> bool {
        text.starts_with(CTCP_MARKER)
    }

    /// Whether a message body is an ACTION envelope.
    pub fn is_action(text: &str) -> bool {
        matches!(Ctcp::parse(text), Some(Ctcp { kind: CtcpKind::Action, .. }))
    }

    /// Wrap a command and its parameters in an envelope.
    pub fn encode(command: &str, params: Option<&str>) -> String {
        match params {
            Some(params) => format!("{CTCP_MARKER}{command} {params}{CTCP_MARKER}"),
            None => format!("{CTCP_MARKER}{command}{CTCP_MARKER}"),
        }
    }
}

impl fmt::Display for Ctcp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::encode(self.kind.as_str(), self.params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        let ctcp = Ctcp::parse("\x01ACTION dances\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Action);
        assert_eq!(ctcp.params, Some("dances"));
    }

    #[test]
    fn test_parse_without_closing_marker() {
        let ctcp = Ctcp::parse("\x01VERSION").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Version);
        assert_eq!(ctcp.params, None);
    }

    #[test]
    fn test_parse_unknown_is_kept() {
        let ctcp = Ctcp::parse("\x01FOO bar baz\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Other("FOO".into()));
        assert_eq!(ctcp.params, Some("bar baz"));
    }

    #[test]
    fn test_parse_rejects_plain_and_empty() {
        assert!(Ctcp::parse("hello").is_none());
        assert!(Ctcp::parse("\x01\x01").is_none());
        assert!(Ctcp::parse("\x01").is_none());
    }

    #[test]
    fn test_is_action() {
        assert!(Ctcp::is_action("\x01ACTION waves\x01"));
        assert!(Ctcp::is_action("\x01action waves\x01"));
        assert!(!Ctcp::is_action("\x01VERSION\x01"));
        assert!(!Ctcp::is_action("ACTION waves"));
    }

    #[test]
    fn test_display_matches_encode() {
        let ctcp = Ctcp {
            kind: CtcpKind::Ping,
            params: Some("12345"),
        };
        assert_eq!(ctcp.to_string(), "\x01PING 12345\x01");
    }
}
