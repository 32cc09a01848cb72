//! Channel records and membership.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use slirc_proto::casemap::IrcKey;

/// A channel privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Role {
    Owner,
    Admin,
    Op,
    HalfOp,
    Voice,
}

impl Role {
    /// The role granted by a mode letter. Owner, admin and half-op exist
    /// only in extended-role mode.
    pub fn from_mode(mode: char, extended: bool) -> Option<Self> {
        match mode {
            'o' => Some(Self::Op),
            'v' => Some(Self::Voice),
            'q' if extended => Some(Self::Owner),
            'a' if extended => Some(Self::Admin),
            'h' if extended => Some(Self::HalfOp),
            _ => None,
        }
    }

    /// The role shown by a name-list prefix character.
    pub fn from_prefix(prefix: char, extended: bool) -> Option<Self> {
        match prefix {
            '@' => Some(Self::Op),
            '+' => Some(Self::Voice),
            '~' if extended => Some(Self::Owner),
            '&' if extended => Some(Self::Admin),
            '%' if extended => Some(Self::HalfOp),
            _ => None,
        }
    }

    pub fn mode(self) -> char {
        match self {
            Self::Owner => 'q',
            Self::Admin => 'a',
            Self::Op => 'o',
            Self::HalfOp => 'h',
            Self::Voice => 'v',
        }
    }

    pub fn prefix(self) -> char {
        match self {
            Self::Owner => '~',
            Self::Admin => '&',
            Self::Op => '@',
            Self::HalfOp => '%',
            Self::Voice => '+',
        }
    }
}

/// Characters that may open a name-list entry.
pub const NAME_PREFIXES: [char; 5] = ['~', '&', '@', '%', '+'];

/// Role sets that only exist when extended roles are enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedRoles {
    pub owners: HashSet<IrcKey>,
    pub admins: HashSet<IrcKey>,
    pub halfops: HashSet<IrcKey>,
}

/// A tracked channel.
///
/// Every role set is a subset of `members`: roles can only be granted to
/// members, and removing a member clears its roles.
#[derive(Debug, Clone)]
pub struct Channel {
    pub name: String,
    pub topic: Option<String>,
    /// Free-form mode letters without parameters, e.g. `nt`.
    pub mode: String,
    pub user_limit: Option<u32>,
    pub key: Option<String>,
    pub bans: HashSet<String>,
    members: HashMap<IrcKey, String>,
    ops: HashSet<IrcKey>,
    voices: HashSet<IrcKey>,
    extended: Option<ExtendedRoles>,
    synced: bool,
    join_started: Instant,
    sync_duration: Option<Duration>,
}

impl Channel {
    pub fn new(name: &str, extended_roles: bool, now: Instant) -> Self {
        Self {
            name: name.to_owned(),
            topic: None,
            mode: String::new(),
            user_limit: None,
            key: None,
            bans: HashSet::new(),
            members: HashMap::new(),
            ops: HashSet::new(),
            voices: HashSet::new(),
            extended: extended_roles.then(ExtendedRoles::default),
            synced: false,
            join_started: now,
            sync_duration: None,
        }
    }

    pub fn is_member(&self, nick: &str) -> bool {
        self.members.contains_key(IrcKey::new(nick).as_str())
    }

    /// Nicknames as last seen, in no particular order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.values().map(String::as_str)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Add a member. An existing member keeps its roles and takes the new
    /// spelling.
    pub fn add_member(&mut self, nick: &str) {
        self.members.insert(IrcKey::new(nick), nick.to_owned());
    }

    /// Remove a member and all of its roles. Returns whether it was a
    /// member.
    pub fn remove_member(&mut self, nick: &str) -> bool {
        let key = IrcKey::new(nick);
        self.ops.remove(&key);
        self.voices.remove(&key);
        if let Some(ext) = self.extended.as_mut() {
            ext.owners.remove(&key);
            ext.admins.remove(&key);
            ext.halfops.remove(&key);
        }
        self.members.remove(&key).is_some()
    }

    /// Move a member to a new nickname, roles included.
    pub fn rename_member(&mut self, old: &str, new: &str) -> bool {
        let old_key = IrcKey::new(old);
        let new_key = IrcKey::new(new);
        if self.members.remove(&old_key).is_none() {
            return false;
        }
        self.members.insert(new_key.clone(), new.to_owned());

        let mut sets: Vec<&mut HashSet<IrcKey>> = vec![&mut self.ops, &mut self.voices];
        if let Some(ext) = self.extended.as_mut() {
            sets.extend([&mut ext.owners, &mut ext.admins, &mut ext.halfops]);
        }
        for set in sets {
            if set.remove(&old_key) {
                set.insert(new_key.clone());
            }
        }
        true
    }

    fn role_set(&self, role: Role) -> Option<&HashSet<IrcKey>> {
        match role {
            Role::Op => Some(&self.ops),
            Role::Voice => Some(&self.voices),
            Role::Owner => self.extended.as_ref().map(|e| &e.owners),
            Role::Admin => self.extended.as_ref().map(|e| &e.admins),
            Role::HalfOp => self.extended.as_ref().map(|e| &e.halfops),
        }
    }

    fn role_set_mut(&mut self, role: Role) -> Option<&mut HashSet<IrcKey>> {
        match role {
            Role::Op => Some(&mut self.ops),
            Role::Voice => Some(&mut self.voices),
            Role::Owner => self.extended.as_mut().map(|e| &mut e.owners),
            Role::Admin => self.extended.as_mut().map(|e| &mut e.admins),
            Role::HalfOp => self.extended.as_mut().map(|e| &mut e.halfops),
        }
    }

    /// Grant or revoke a role. Non-members and roles this channel does not
    /// track are ignored; returns whether anything changed.
    pub fn set_role(&mut self, nick: &str, role: Role, granted: bool) -> bool {
        let key = IrcKey::new(nick);
        if !self.members.contains_key(&key) {
            return false;
        }
        let Some(set) = self.role_set_mut(role) else {
            return false;
        };
        if granted {
            set.insert(key)
        } else {
            set.remove(&key)
        }
    }

    pub fn has_role(&self, nick: &str, role: Role) -> bool {
        self.role_set(role)
            .is_some_and(|set| set.contains(IrcKey::new(nick).as_str()))
    }

    /// Nicknames holding `role`.
    pub fn with_role(&self, role: Role) -> Vec<&str> {
        self.role_set(role)
            .into_iter()
            .flatten()
            .filter_map(|key| self.members.get(key).map(String::as_str))
            .collect()
    }

    pub fn extended_roles(&self) -> bool {
        self.extended.is_some()
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Time from join to the end of the bootstrap, once synced.
    pub fn sync_duration(&self) -> Option<Duration> {
        self.sync_duration
    }

    /// Flip the synced flag. Only the first call returns the duration.
    pub fn mark_synced(&mut self, now: Instant) -> Option<Duration> {
        if self.synced {
            return None;
        }
        self.synced = true;
        let duration = now.saturating_duration_since(self.join_started);
        self.sync_duration = Some(duration);
        Some(duration)
    }

    /// Check that every role holder is a member.
    pub fn roles_consistent(&self) -> bool {
        let mut sets = vec![&self.ops, &self.voices];
        if let Some(ext) = &self.extended {
            sets.extend([&ext.owners, &ext.admins, &ext.halfops]);
        }
        sets.iter()
            .all(|set| set.iter().all(|key| self.members.contains_key(key)))
    }
}

/// A snapshot of one member's roles in one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberRoles {
    pub owner: bool,
    pub admin: bool,
    pub op: bool,
    pub halfop: bool,
    pub voice: bool,
}

impl MemberRoles {
    pub fn of(channel: &Channel, nick: &str) -> Self {
        Self {
            owner: channel.has_role(nick, Role::Owner),
            admin: channel.has_role(nick, Role::Admin),
            op: channel.has_role(nick, Role::Op),
            halfop: channel.has_role(nick, Role::HalfOp),
            voice: channel.has_role(nick, Role::Voice),
        }
    }

    /// Highest prefix character. Priority: ~ > & > @ > % > +
    pub fn prefix_char(&self) -> Option<char> {
        [
            (self.owner, Role::Owner),
            (self.admin, Role::Admin),
            (self.op, Role::Op),
            (self.halfop, Role::HalfOp),
            (self.voice, Role::Voice),
        ]
        .into_iter()
        .find_map(|(held, role)| held.then(|| role.prefix()))
    }
}

/// Split a name-list entry into its roles and bare nickname.
///
/// Every leading prefix character is stripped, whether or not it maps to a
/// role in the current mode.
pub fn split_name_prefix(entry: &str, extended: bool) -> (Vec<Role>, &str) {
    let nick = entry.trim_start_matches(NAME_PREFIXES);
    let roles = entry[..entry.len() - nick.len()]
        .chars()
        .filter_map(|c| Role::from_prefix(c, extended))
        .collect();
    (roles, nick)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(extended: bool) -> Channel {
        Channel::new("#Rust", extended, Instant::now())
    }

    #[test]
    fn test_case_insensitive_membership() {
        let mut c = channel(false);
        c.add_member("Alice");
        assert!(c.is_member("alice"));
        assert!(c.is_member("ALICE"));
        assert_eq!(c.members().collect::<Vec<_>>(), vec!["Alice"]);
    }

    #[test]
    fn test_roles_require_membership() {
        let mut c = channel(false);
        assert!(!c.set_role("bob", Role::Op, true));
        c.add_member("bob");
        assert!(c.set_role("bob", Role::Op, true));
        assert!(c.has_role("BOB", Role::Op));
        assert!(c.remove_member("bob"));
        assert!(!c.has_role("bob", Role::Op));
        assert!(c.roles_consistent());
    }

    #[test]
    fn test_extended_roles_ignored_when_disabled() {
        let mut c = channel(false);
        c.add_member("bob");
        assert!(!c.set_role("bob", Role::HalfOp, true));
        assert!(!c.has_role("bob", Role::HalfOp));

        let mut c = channel(true);
        c.add_member("bob");
        assert!(c.set_role("bob", Role::HalfOp, true));
        assert_eq!(c.with_role(Role::HalfOp), vec!["bob"]);
    }

    #[test]
    fn test_rename_moves_roles() {
        let mut c = channel(true);
        c.add_member("bob");
        c.set_role("bob", Role::Op, true);
        c.set_role("bob", Role::Owner, true);
        assert!(c.rename_member("bob", "robert"));
        assert!(!c.is_member("bob"));
        assert!(c.has_role("robert", Role::Op));
        assert!(c.has_role("robert", Role::Owner));
        assert_eq!(c.member_count(), 1);
    }

    #[test]
    fn test_case_only_rename() {
        let mut c = channel(false);
        c.add_member("bob");
        c.set_role("bob", Role::Voice, true);
        assert!(c.rename_member("bob", "Bob"));
        assert_eq!(c.member_count(), 1);
        assert_eq!(c.members().collect::<Vec<_>>(), vec!["Bob"]);
        assert!(c.has_role("bob", Role::Voice));
    }

    #[test]
    fn test_mark_synced_once() {
        let start = Instant::now();
        let mut c = Channel::new("#a", false, start);
        let first = c.mark_synced(start + Duration::from_millis(30));
        assert_eq!(first, Some(Duration::from_millis(30)));
        assert_eq!(c.mark_synced(start + Duration::from_secs(5)), None);
        assert_eq!(c.sync_duration(), Some(Duration::from_millis(30)));
    }

    #[test]
    fn test_split_name_prefix() {
        assert_eq!(split_name_prefix("@op1", false), (vec![Role::Op], "op1"));
        assert_eq!(split_name_prefix("plain", false), (vec![], "plain"));
        assert_eq!(split_name_prefix("%half", false), (vec![], "half"));
        assert_eq!(
            split_name_prefix("~@owner", true),
            (vec![Role::Owner, Role::Op], "owner")
        );
    }

    #[test]
    fn test_prefix_char_priority() {
        let roles = MemberRoles {
            op: true,
            voice: true,
            ..MemberRoles::default()
        };
        assert_eq!(roles.prefix_char(), Some('@'));
        assert_eq!(MemberRoles::default().prefix_char(), None);
    }
}
