//! Mode-string interpretation.
//!
//! A mode string such as `+ov-b` is read left to right: `+` and `-` set the
//! direction for the letters that follow, and every letter that takes a
//! parameter consumes the next one from the parameter list in lockstep.
//!
//! ```
//! use slirc_proto::mode::{ModeChange, ModeTable};
//!
//! let table = ModeTable::default();
//! let changes = table.parse("+ov-b", &["alice", "bob", "*!*@spam"]);
//! assert_eq!(changes[0], ModeChange::add('o', Some("alice")));
//! assert_eq!(changes[2], ModeChange::remove('b', Some("*!*@spam")));
//! ```

use crate::isupport::ChanModes;

/// One letter of a mode string with its direction and parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeChange<'a> {
    /// `true` for `+`, `false` for `-`.
    pub adding: bool,
    /// The mode letter.
    pub mode: char,
    /// The consumed parameter, for letters that take one.
    pub param: Option<&'a str>,
}

impl<'a> ModeChange<'a> {
    /// A `+` change.
    pub const fn add(mode: char, param: Option<&'a str>) -> Self {
        Self {
            adding: true,
            mode,
            param,
        }
    }

    /// A `-` change.
    pub const fn remove(mode: char, param: Option<&'a str>) -> Self {
        Self {
            adding: false,
            mode,
            param,
        }
    }
}

/// Knows which channel mode letters consume a parameter.
///
/// Op, voice, ban, key, ban-exception and invite-exception always do; the
/// limit does only when set. Half-op, admin and owner do in extended-role
/// mode. `CHANMODES` from the server can add more letters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModeTable {
    extended_roles: bool,
    chanmodes: Option<ChanModes>,
}

impl ModeTable {
    /// A table with or without the extended roles.
    pub fn new(extended_roles: bool) -> Self {
        Self {
            extended_roles,
            chanmodes: None,
        }
    }

    /// Extend the parameter-taking set from a server `CHANMODES` token.
    pub fn with_chanmodes(mut self, chanmodes: Option<ChanModes>) -> Self {
        self.chanmodes = chanmodes;
        self
    }

    /// Whether extended roles are enabled.
    pub fn extended_roles(&self) -> bool {
        self.extended_roles
    }

    /// Whether `mode` consumes a parameter in the given direction.
    pub fn takes_param(&self, mode: char, adding: bool) -> bool {
        match mode {
            'o' | 'v' | 'b' | 'k' | 'e' | 'I' => true,
            'l' => adding,
            'h' | 'a' | 'q' if self.extended_roles => true,
            _ => self
                .chanmodes
                .as_ref()
                .is_some_and(|c| c.takes_param(mode, adding)),
        }
    }

    /// Interpret a channel mode string against its parameters.
    ///
    /// A letter that needs a parameter when none is left is dropped. A
    /// string with no leading sign is read as `+`.
    pub fn parse<'p>(&self, modes: &str, params: &[&'p str]) -> Vec<ModeChange<'p>> {
        let mut params = params.iter().copied();
        let mut adding = true;
        let mut changes = Vec::with_capacity(modes.len());

        for mode in modes.chars() {
            match mode {
                '+' => adding = true,
                '-' => adding = false,
                _ if self.takes_param(mode, adding) => match params.next() {
                    Some(param) => changes.push(ModeChange {
                        adding,
                        mode,
                        param: Some(param),
                    }),
                    None => continue,
                },
                _ => changes.push(ModeChange {
                    adding,
                    mode,
                    param: None,
                }),
            }
        }
        changes
    }
}

/// Apply parameterless `+`/`-` letters to a free-form mode string, as kept
/// for user modes and unrecognized channel modes.
///
/// ```
/// use slirc_proto::mode::apply_flags;
///
/// let mut modes = String::from("nt");
/// apply_flags(&mut modes, "+i-t");
/// assert_eq!(modes, "ni");
/// ```
pub fn apply_flags(current: &mut String, modes: &str) {
    let mut adding = true;
    for mode in modes.chars() {
        match mode {
            '+' => adding = true,
            '-' => adding = false,
            _ => set_flag(current, mode, adding),
        }
    }
}

/// Add or strip a single letter of a free-form mode string.
pub fn set_flag(current: &mut String, mode: char, adding: bool) {
    if adding {
        if !current.contains(mode) {
            current.push(mode);
        }
    } else {
        current.retain(|c| c != mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lockstep_parameters() {
        let table = ModeTable::default();
        let changes = table.parse("+o-v+k", &["alice", "bob", "secret"]);
        assert_eq!(
            changes,
            vec![
                ModeChange::add('o', Some("alice")),
                ModeChange::remove('v', Some("bob")),
                ModeChange::add('k', Some("secret")),
            ]
        );
    }

    #[test]
    fn test_limit_only_takes_param_when_set() {
        let table = ModeTable::default();
        let changes = table.parse("+l-l+o", &["25", "alice"]);
        assert_eq!(
            changes,
            vec![
                ModeChange::add('l', Some("25")),
                ModeChange::remove('l', None),
                ModeChange::add('o', Some("alice")),
            ]
        );
    }

    #[test]
    fn test_unknown_letters_carry_no_param() {
        let table = ModeTable::default();
        let changes = table.parse("+ntb", &["*!*@x"]);
        assert_eq!(
            changes,
            vec![
                ModeChange::add('n', None),
                ModeChange::add('t', None),
                ModeChange::add('b', Some("*!*@x")),
            ]
        );
    }

    #[test]
    fn test_missing_param_skips_letter() {
        let table = ModeTable::default();
        let changes = table.parse("+bo", &["*!*@x"]);
        assert_eq!(changes, vec![ModeChange::add('b', Some("*!*@x"))]);
    }

    #[test]
    fn test_extended_roles_take_params() {
        let plain = ModeTable::new(false);
        assert!(!plain.takes_param('h', true));

        let extended = ModeTable::new(true);
        let changes = extended.parse("+hq", &["a", "b"]);
        assert_eq!(
            changes,
            vec![ModeChange::add('h', Some("a")), ModeChange::add('q', Some("b"))]
        );
    }

    #[test]
    fn test_exception_lists_keep_alignment() {
        let table = ModeTable::default();
        let changes = table.parse("+eIo", &["e!*@*", "i!*@*", "alice"]);
        assert_eq!(changes[2], ModeChange::add('o', Some("alice")));
    }

    #[test]
    fn test_chanmodes_extend_param_set() {
        let table = ModeTable::default().with_chanmodes(ChanModes::parse("beIq,k,lj,imnt"));
        let changes = table.parse("+jq", &["3:5", "quiet!*@*"]);
        assert_eq!(
            changes,
            vec![
                ModeChange::add('j', Some("3:5")),
                ModeChange::add('q', Some("quiet!*@*")),
            ]
        );
    }

    #[test]
    fn test_apply_flags() {
        let mut modes = String::new();
        apply_flags(&mut modes, "+nt");
        apply_flags(&mut modes, "+n");
        assert_eq!(modes, "nt");
        apply_flags(&mut modes, "-n+s");
        assert_eq!(modes, "ts");
    }
}
