//! IRC case-mapping functions.
//!
//! Nicknames and channel names compare case-insensitively under the
//! `rfc1459` mapping, where `[]\~` are the uppercase forms of `{}|^`.
//! [`IrcKey`] wraps a folded name so it can be used directly as a map key.

use std::borrow::Borrow;
use std::fmt;

/// Fold a single character using the RFC 1459 case mapping.
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        'A'..='Z' => (c as u8 + 32) as char,
        _ => c,
    }
}

/// Fold a string using the RFC 1459 case mapping.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Compare two names case-insensitively under RFC 1459.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .chars()
            .zip(b.chars())
            .all(|(ca, cb)| irc_lower_char(ca) == irc_lower_char(cb))
}

/// A case-folded nickname or channel name.
///
/// Two keys built from names that differ only in case are equal and hash
/// identically.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IrcKey(String);

impl IrcKey {
    /// Fold `name` into a key.
    pub fn new(name: &str) -> Self {
        Self(irc_to_lower(name))
    }

    /// The folded form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IrcKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Borrow<str> for IrcKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for IrcKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IrcKey({:?})", self.0)
    }
}

impl fmt::Display for IrcKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_irc_lower_char() {
        assert_eq!(irc_lower_char('A'), 'a');
        assert_eq!(irc_lower_char('['), '{');
        assert_eq!(irc_lower_char(']'), '}');
        assert_eq!(irc_lower_char('\\'), '|');
        assert_eq!(irc_lower_char('~'), '^');
        assert_eq!(irc_lower_char('#'), '#');
    }

    #[test]
    fn test_irc_eq() {
        assert!(irc_eq("#Foo", "#foo"));
        assert!(irc_eq("nick[away]", "NICK{AWAY}"));
        assert!(!irc_eq("short", "longer"));
        assert!(!irc_eq("alice", "bob"));
    }

    #[test]
    fn test_key_lookup_is_case_insensitive() {
        let mut map = HashMap::new();
        map.insert(IrcKey::new("#Foo"), 1);
        assert_eq!(map.get(&IrcKey::new("#foo")), Some(&1));
        assert_eq!(map.get("#foo"), Some(&1));
        assert_eq!(map.get(&IrcKey::new("#FOO")), Some(&1));
    }
}
