//! IRC message prefix types.
//!
//! A prefix identifies the origin of a message: either a server name or a
//! user's `nick[!ident][@host]` mask.
//!
//! # Reference
//! - RFC 2812 Section 2.3.1: Message format

use std::fmt;

use crate::error::MessageParseError;

/// IRC message prefix - identifies the origin of a message.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Prefix {
    /// Server name (e.g., "irc.example.com").
    ServerName(String),
    /// A user. Ident and host are absent when the server did not send them.
    User {
        /// Nickname.
        nick: String,
        /// Username (ident), the part after `!`.
        ident: Option<String>,
        /// Hostname, the part after `@`.
        host: Option<String>,
    },
}

impl Prefix {
    /// Parse a prefix string (without the leading `:`).
    ///
    /// Grammar: `nick [ "!" ident ] [ "@" host ]`. A bare name with neither
    /// `!` nor `@` is a server when it contains a dot, otherwise a user whose
    /// ident and host are unknown.
    pub fn parse(s: &str) -> Result<Self, MessageParseError> {
        if s.is_empty() {
            return Err(MessageParseError::EmptyPrefix);
        }

        let (rest, host) = match s.find('@') {
            Some(at) => (&s[..at], Some(&s[at + 1..])),
            None => (s, None),
        };
        let (nick, ident) = match rest.find('!') {
            Some(bang) => (&rest[..bang], Some(&rest[bang + 1..])),
            None => (rest, None),
        };

        if ident.is_none() && host.is_none() && nick.contains('.') {
            return Ok(Prefix::ServerName(nick.to_owned()));
        }

        Ok(Prefix::User {
            nick: nick.to_owned(),
            ident: ident.map(str::to_owned),
            host: host.map(str::to_owned),
        })
    }

    /// Create a user prefix with every component known.
    pub fn user(nick: impl Into<String>, ident: impl Into<String>, host: impl Into<String>) -> Self {
        Prefix::User {
            nick: nick.into(),
            ident: Some(ident.into()),
            host: Some(host.into()),
        }
    }

    /// The nickname, or the server name for server prefixes.
    pub fn nick(&self) -> &str {
        match self {
            Prefix::ServerName(name) => name,
            Prefix::User { nick, .. } => nick,
        }
    }

    /// The ident, if this is a user prefix that carried one.
    pub fn ident(&self) -> Option<&str> {
        match self {
            Prefix::User { ident, .. } => ident.as_deref(),
            Prefix::ServerName(_) => None,
        }
    }

    /// The host, if this is a user prefix that carried one.
    pub fn host(&self) -> Option<&str> {
        match self {
            Prefix::User { host, .. } => host.as_deref(),
            Prefix::ServerName(_) => None,
        }
    }

    /// Whether the message originated from a server.
    pub fn is_server(&self) -> bool {
        matches!(self, Prefix::ServerName(_))
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => f.write_str(name),
            Prefix::User { nick, ident, host } => {
                f.write_str(nick)?;
                if let Some(ident) = ident {
                    write!(f, "!{}", ident)?;
                }
                if let Some(host) = host {
                    write!(f, "@{}", host)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_user_prefix() {
        let p = Prefix::parse("nick!ident@host.example.com").unwrap();
        assert_eq!(p.nick(), "nick");
        assert_eq!(p.ident(), Some("ident"));
        assert_eq!(p.host(), Some("host.example.com"));
        assert!(!p.is_server());
    }

    #[test]
    fn test_server_prefix() {
        let p = Prefix::parse("irc.example.net").unwrap();
        assert_eq!(p, Prefix::ServerName("irc.example.net".into()));
        assert_eq!(p.nick(), "irc.example.net");
        assert_eq!(p.ident(), None);
        assert_eq!(p.host(), None);
    }

    #[test]
    fn test_bare_nick_is_user_without_ident_or_host() {
        let p = Prefix::parse("NickServ").unwrap();
        assert_eq!(
            p,
            Prefix::User {
                nick: "NickServ".into(),
                ident: None,
                host: None
            }
        );
    }

    #[test]
    fn test_host_without_ident() {
        let p = Prefix::parse("nick@host").unwrap();
        assert_eq!(p.ident(), None);
        assert_eq!(p.host(), Some("host"));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        assert_eq!(Prefix::parse(""), Err(MessageParseError::EmptyPrefix));
    }

    #[test]
    fn test_display_round_trip() {
        for raw in ["a!b@c", "a@c", "irc.example.net", "nick"] {
            assert_eq!(Prefix::parse(raw).unwrap().to_string(), raw);
        }
    }
}
