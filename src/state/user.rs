//! User records.

use crate::event::WhoInfo;

/// What is known about one user.
///
/// Fields other than the nickname fill in as WHO replies and prefixes
/// arrive; empty strings mean "not seen yet".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub nick: String,
    pub ident: String,
    pub host: String,
    pub realname: String,
    pub server: String,
    pub hop_count: u32,
    pub away: bool,
    /// IRC operator.
    pub oper: bool,
    /// Identified to services.
    pub registered: bool,
}

impl User {
    pub fn new(nick: &str) -> Self {
        Self {
            nick: nick.to_owned(),
            ..Self::default()
        }
    }

    /// Fill ident and host from a message prefix, keeping known values when
    /// the prefix lacks them.
    pub fn observe_prefix(&mut self, ident: Option<&str>, host: Option<&str>) {
        if let Some(ident) = ident {
            self.ident = ident.to_owned();
        }
        if let Some(host) = host {
            self.host = host.to_owned();
        }
    }

    /// Refresh from a WHO reply.
    pub fn apply_who(&mut self, who: &WhoInfo) {
        self.ident.clone_from(&who.ident);
        self.host.clone_from(&who.host);
        self.server.clone_from(&who.server);
        self.realname.clone_from(&who.realname);
        self.hop_count = who.hop_count;
        self.away = who.away;
        self.oper = who.oper;
        self.registered = who.registered;
    }

    /// `nick!ident@host`, with `*` for unknown parts.
    pub fn mask(&self) -> String {
        let part = |s: &str| if s.is_empty() { "*".to_owned() } else { s.to_owned() };
        format!("{}!{}@{}", self.nick, part(&self.ident), part(&self.host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        let mut user = User::new("alice");
        assert_eq!(user.mask(), "alice!*@*");
        user.observe_prefix(Some("al"), None);
        user.observe_prefix(None, Some("example.org"));
        assert_eq!(user.mask(), "alice!al@example.org");
    }
}
