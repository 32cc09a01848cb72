//! Server capability advertisement (`RPL_ISUPPORT`, numeric 005).
//!
//! Servers send one or more 005 lines after registration. [`Isupport`]
//! accumulates their `KEY` / `KEY=VALUE` tokens and exposes the handful the
//! client consults: `PREFIX` (which role prefixes exist) and `CHANMODES`
//! (which mode letters take a parameter).
//!
//! # Reference
//! - Modern IRC documentation: <https://modern.ircdocs.horse/isupport.html>

use std::collections::HashMap;

/// Accumulated ISUPPORT tokens.
///
/// ```
/// use slirc_proto::isupport::Isupport;
///
/// let mut isupport = Isupport::default();
/// isupport.absorb(&["me", "NETWORK=TestNet", "PREFIX=(qaohv)~&@%+", "are supported by this server"]);
///
/// assert_eq!(isupport.get("network"), Some(Some("TestNet")));
/// assert!(isupport.supports_extended_roles());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Isupport {
    entries: HashMap<String, Option<String>>,
}

impl Isupport {
    /// Absorb the parameters of one 005 reply.
    ///
    /// The first parameter (our nickname) is skipped, as is the final
    /// human-readable text. A `-KEY` token withdraws a previous entry.
    pub fn absorb(&mut self, params: &[&str]) {
        let Some((_, mut tokens)) = params.split_first() else {
            return;
        };
        if let Some((last, rest)) = tokens.split_last() {
            if last.contains(' ') {
                tokens = rest;
            }
        }

        for token in tokens.iter().filter(|t| !t.is_empty()) {
            if let Some(key) = token.strip_prefix('-') {
                self.entries.remove(&key.to_ascii_uppercase());
                continue;
            }
            let (key, value) = match token.split_once('=') {
                Some((key, value)) => (key, Some(value.to_owned())),
                None => (*token, None),
            };
            self.entries.insert(key.to_ascii_uppercase(), value);
        }
    }

    /// Look up a token.
    ///
    /// `Some(Some(v))` for `KEY=v`, `Some(None)` for a bare `KEY`, `None`
    /// when absent.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .get(&key.to_ascii_uppercase())
            .map(|v| v.as_deref())
    }

    /// The parsed `PREFIX` token.
    pub fn prefix(&self) -> Option<PrefixSpec> {
        self.get("PREFIX").flatten().and_then(PrefixSpec::parse)
    }

    /// The parsed `CHANMODES` token.
    pub fn chanmodes(&self) -> Option<ChanModes> {
        self.get("CHANMODES").flatten().and_then(ChanModes::parse)
    }

    /// Whether the server advertises any of the owner, admin or half-op
    /// roles.
    pub fn supports_extended_roles(&self) -> bool {
        self.prefix()
            .is_some_and(|spec| spec.modes.chars().any(|m| matches!(m, 'q' | 'a' | 'h')))
    }

    /// Forget everything; used when a new connection starts.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Parsed `PREFIX` token mapping role modes to nickname prefixes.
///
/// ```
/// use slirc_proto::isupport::PrefixSpec;
///
/// let spec = PrefixSpec::parse("(ov)@+").unwrap();
/// assert_eq!(spec.prefix_for_mode('o'), Some('@'));
/// assert_eq!(spec.mode_for_prefix('+'), Some('v'));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixSpec {
    /// Mode letters, highest rank first.
    pub modes: String,
    /// Prefix symbols in the same order.
    pub prefixes: String,
}

impl PrefixSpec {
    /// Parse a value like `(ov)@+`. The two halves must have equal length.
    pub fn parse(value: &str) -> Option<Self> {
        let inner = value.strip_prefix('(')?;
        let (modes, prefixes) = inner.split_once(')')?;
        if modes.chars().count() != prefixes.chars().count() {
            return None;
        }
        Some(Self {
            modes: modes.to_owned(),
            prefixes: prefixes.to_owned(),
        })
    }

    /// The prefix symbol for a mode letter.
    pub fn prefix_for_mode(&self, mode: char) -> Option<char> {
        let index = self.modes.chars().position(|m| m == mode)?;
        self.prefixes.chars().nth(index)
    }

    /// The mode letter for a prefix symbol.
    pub fn mode_for_prefix(&self, prefix: char) -> Option<char> {
        let index = self.prefixes.chars().position(|p| p == prefix)?;
        self.modes.chars().nth(index)
    }
}

/// Parsed `CHANMODES=A,B,C,D` token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChanModes {
    /// Type A: list modes, always take a parameter.
    pub list: String,
    /// Type B: always take a parameter.
    pub always: String,
    /// Type C: take a parameter only when set.
    pub on_set: String,
    /// Type D: never take a parameter.
    pub never: String,
}

impl ChanModes {
    /// Parse the comma-separated groups. Missing trailing groups are empty.
    pub fn parse(value: &str) -> Option<Self> {
        let mut groups = value.split(',');
        let list = groups.next()?.to_owned();
        Some(Self {
            list,
            always: groups.next().unwrap_or_default().to_owned(),
            on_set: groups.next().unwrap_or_default().to_owned(),
            never: groups.next().unwrap_or_default().to_owned(),
        })
    }

    /// Whether `mode` consumes a parameter in the given direction.
    pub fn takes_param(&self, mode: char, adding: bool) -> bool {
        self.list.contains(mode) || self.always.contains(mode) || (adding && self.on_set.contains(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_multiple_lines() {
        let mut isupport = Isupport::default();
        isupport.absorb(&["me", "CHANTYPES=#&", "EXCEPTS", "are supported by this server"]);
        isupport.absorb(&["me", "PREFIX=(ov)@+", "are supported by this server"]);

        assert_eq!(isupport.get("CHANTYPES"), Some(Some("#&")));
        assert_eq!(isupport.get("excepts"), Some(None));
        assert_eq!(isupport.get("NETWORK"), None);
        assert!(!isupport.supports_extended_roles());
    }

    #[test]
    fn test_negated_token_removes_entry() {
        let mut isupport = Isupport::default();
        isupport.absorb(&["me", "EXCEPTS=e"]);
        isupport.absorb(&["me", "-EXCEPTS"]);
        assert_eq!(isupport.get("EXCEPTS"), None);
    }

    #[test]
    fn test_extended_roles_gate() {
        let mut isupport = Isupport::default();
        isupport.absorb(&["me", "PREFIX=(ohv)@%+"]);
        assert!(isupport.supports_extended_roles());
    }

    #[test]
    fn test_prefix_spec_rejects_mismatch() {
        assert!(PrefixSpec::parse("(ov)@").is_none());
        assert!(PrefixSpec::parse("ov@+").is_none());
    }

    #[test]
    fn test_chanmodes() {
        let modes = ChanModes::parse("beI,k,l,imnpst").unwrap();
        assert!(modes.takes_param('b', true));
        assert!(modes.takes_param('I', false));
        assert!(modes.takes_param('k', false));
        assert!(modes.takes_param('l', true));
        assert!(!modes.takes_param('l', false));
        assert!(!modes.takes_param('m', true));
    }
}
