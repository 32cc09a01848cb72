//! Numeric reply codes the client understands.
//!
//! Only the replies that drive classification or state tracking are named;
//! everything else travels as a bare number.

/// A three-digit numeric reply code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplyCode(pub u16);

#[allow(missing_docs)]
impl ReplyCode {
    pub const RPL_WELCOME: Self = Self(1);
    pub const RPL_YOURHOST: Self = Self(2);
    pub const RPL_CREATED: Self = Self(3);
    pub const RPL_MYINFO: Self = Self(4);
    pub const RPL_ISUPPORT: Self = Self(5);
    pub const RPL_UMODEIS: Self = Self(221);
    pub const RPL_LUSERCLIENT: Self = Self(251);
    pub const RPL_LUSEROP: Self = Self(252);
    pub const RPL_LUSERUNKNOWN: Self = Self(253);
    pub const RPL_LUSERCHANNELS: Self = Self(254);
    pub const RPL_LUSERME: Self = Self(255);
    pub const RPL_LOCALUSERS: Self = Self(265);
    pub const RPL_GLOBALUSERS: Self = Self(266);
    pub const RPL_AWAY: Self = Self(301);
    pub const RPL_UNAWAY: Self = Self(305);
    pub const RPL_NOWAWAY: Self = Self(306);
    pub const RPL_WHOISUSER: Self = Self(311);
    pub const RPL_WHOISSERVER: Self = Self(312);
    pub const RPL_WHOISOPERATOR: Self = Self(313);
    pub const RPL_WHOWASUSER: Self = Self(314);
    pub const RPL_ENDOFWHO: Self = Self(315);
    pub const RPL_WHOISIDLE: Self = Self(317);
    pub const RPL_ENDOFWHOIS: Self = Self(318);
    pub const RPL_WHOISCHANNELS: Self = Self(319);
    pub const RPL_LISTSTART: Self = Self(321);
    pub const RPL_LIST: Self = Self(322);
    pub const RPL_LISTEND: Self = Self(323);
    pub const RPL_CHANNELMODEIS: Self = Self(324);
    pub const RPL_NOTOPIC: Self = Self(331);
    pub const RPL_TOPIC: Self = Self(332);
    pub const RPL_WHOREPLY: Self = Self(352);
    pub const RPL_NAMREPLY: Self = Self(353);
    pub const RPL_ENDOFNAMES: Self = Self(366);
    pub const RPL_BANLIST: Self = Self(367);
    pub const RPL_ENDOFBANLIST: Self = Self(368);
    pub const RPL_ENDOFWHOWAS: Self = Self(369);
    pub const RPL_MOTD: Self = Self(372);
    pub const RPL_MOTDSTART: Self = Self(375);
    pub const RPL_ENDOFMOTD: Self = Self(376);
    pub const ERR_NOMOTD: Self = Self(422);
    pub const ERR_ERRONEUSNICKNAME: Self = Self(432);
    pub const ERR_NICKNAMEINUSE: Self = Self(433);
    pub const ERR_NOCHANMODES: Self = Self(477);
    pub const RPL_LOGGEDIN: Self = Self(900);
    pub const RPL_SASLSUCCESS: Self = Self(903);
    pub const ERR_SASLFAIL: Self = Self(904);
    pub const ERR_SASLTOOLONG: Self = Self(905);
    pub const ERR_SASLABORTED: Self = Self(906);
    pub const ERR_SASLALREADY: Self = Self(907);

    /// Parse a command token into a reply code. Exactly three ASCII digits.
    pub fn from_command(command: &str) -> Option<Self> {
        if command.len() == 3 && command.bytes().all(|b| b.is_ascii_digit()) {
            command.parse().ok().map(Self)
        } else {
            None
        }
    }

    /// The numeric value.
    pub const fn code(self) -> u16 {
        self.0
    }

    /// Whether this code falls in the error-reply range (400-599).
    pub const fn is_error(self) -> bool {
        self.0 >= 400 && self.0 <= 599
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_command() {
        assert_eq!(ReplyCode::from_command("001"), Some(ReplyCode::RPL_WELCOME));
        assert_eq!(ReplyCode::from_command("353"), Some(ReplyCode::RPL_NAMREPLY));
        assert_eq!(ReplyCode::from_command("PRIVMSG"), None);
        assert_eq!(ReplyCode::from_command("01"), None);
        assert_eq!(ReplyCode::from_command("0001"), None);
    }

    #[test]
    fn test_error_range() {
        assert!(ReplyCode(400).is_error());
        assert!(ReplyCode(599).is_error());
        assert!(!ReplyCode(399).is_error());
        assert!(!ReplyCode(600).is_error());
    }

    #[test]
    fn test_display_is_zero_padded() {
        assert_eq!(ReplyCode::RPL_WELCOME.to_string(), "001");
        assert_eq!(ReplyCode::RPL_ENDOFBANLIST.to_string(), "368");
    }
}
