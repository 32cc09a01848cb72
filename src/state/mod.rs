//! The membership model.
//!
//! [`Model`] owns every tracked channel and user. It is mutated only by the
//! synchronizer; everyone else reads cloned snapshots. A user record exists
//! only while it is a member of at least one tracked channel, or while it is
//! the local user.

mod channel;
mod user;

use std::collections::HashMap;
use std::time::Instant;

use slirc_proto::casemap::{IrcKey, irc_eq};

pub use channel::{Channel, ExtendedRoles, MemberRoles, NAME_PREFIXES, Role, split_name_prefix};
pub use user::User;

/// One member of one channel: the user record plus its roles there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelUser {
    pub channel: String,
    pub user: User,
    pub roles: MemberRoles,
}

#[derive(Debug, Default)]
pub struct Model {
    channels: HashMap<IrcKey, Channel>,
    users: HashMap<IrcKey, User>,
    me: Option<String>,
    /// Our own user modes.
    pub usermode: String,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Our nickname, once known.
    pub fn me(&self) -> Option<&str> {
        self.me.as_deref()
    }

    pub fn is_me(&self, nick: &str) -> bool {
        self.me.as_deref().is_some_and(|me| irc_eq(me, nick))
    }

    /// Set our nickname, creating our user record.
    pub fn set_me(&mut self, nick: &str) {
        let old = self.me.replace(nick.to_owned());
        self.ensure_user(nick).nick = nick.to_owned();
        if let Some(old) = old
            && !irc_eq(&old, nick)
        {
            self.collect_user(&old);
        }
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(IrcKey::new(name).as_str())
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.get_mut(IrcKey::new(name).as_str())
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Start tracking a channel. An existing record is replaced.
    pub fn add_channel(&mut self, name: &str, extended_roles: bool, now: Instant) -> &mut Channel {
        let key = IrcKey::new(name);
        if let Some(old) = self.channels.remove(&key) {
            self.collect_members(&old);
        }
        self.channels
            .entry(key)
            .or_insert_with(|| Channel::new(name, extended_roles, now))
    }

    /// Stop tracking a channel and drop users that were only seen there.
    pub fn remove_channel(&mut self, name: &str) -> Option<Channel> {
        let channel = self.channels.remove(IrcKey::new(name).as_str())?;
        self.collect_members(&channel);
        Some(channel)
    }

    fn collect_members(&mut self, channel: &Channel) {
        let nicks: Vec<String> = channel.members().map(str::to_owned).collect();
        for nick in nicks {
            self.collect_user(&nick);
        }
    }

    pub fn user(&self, nick: &str) -> Option<&User> {
        self.users.get(IrcKey::new(nick).as_str())
    }

    pub fn user_mut(&mut self, nick: &str) -> Option<&mut User> {
        self.users.get_mut(IrcKey::new(nick).as_str())
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    fn ensure_user(&mut self, nick: &str) -> &mut User {
        self.users
            .entry(IrcKey::new(nick))
            .or_insert_with(|| User::new(nick))
    }

    /// Add `nick` to a tracked channel, creating its user record. Returns
    /// `None` when the channel is not tracked.
    pub fn add_member(&mut self, channel: &str, nick: &str) -> Option<&mut User> {
        self.channels.get_mut(IrcKey::new(channel).as_str())?.add_member(nick);
        Some(self.ensure_user(nick))
    }

    /// Remove `nick` from one channel. Returns whether it was a member.
    pub fn remove_member(&mut self, channel: &str, nick: &str) -> bool {
        let removed = self
            .channels
            .get_mut(IrcKey::new(channel).as_str())
            .is_some_and(|c| c.remove_member(nick));
        self.collect_user(nick);
        removed
    }

    /// Remove `nick` from every channel. Returns the channels it left.
    pub fn remove_everywhere(&mut self, nick: &str) -> Vec<String> {
        let left = self
            .channels
            .values_mut()
            .filter_map(|c| c.remove_member(nick).then(|| c.name.clone()))
            .collect();
        self.collect_user(nick);
        left
    }

    /// Re-key a user and its memberships. Returns the channels it is in.
    pub fn rename(&mut self, old: &str, new: &str) -> Vec<String> {
        if let Some(mut user) = self.users.remove(IrcKey::new(old).as_str()) {
            user.nick = new.to_owned();
            self.users.insert(IrcKey::new(new), user);
        }
        if self.is_me(old) {
            self.me = Some(new.to_owned());
        }
        self.channels
            .values_mut()
            .filter_map(|c| c.rename_member(old, new).then(|| c.name.clone()))
            .collect()
    }

    /// Drop a user record that no channel references.
    fn collect_user(&mut self, nick: &str) {
        if self.is_me(nick) || self.channels.values().any(|c| c.is_member(nick)) {
            return;
        }
        self.users.remove(IrcKey::new(nick).as_str());
    }

    pub fn channel_user(&self, channel: &str, nick: &str) -> Option<ChannelUser> {
        let chan = self.channel(channel)?;
        if !chan.is_member(nick) {
            return None;
        }
        Some(ChannelUser {
            channel: chan.name.clone(),
            user: self.user(nick)?.clone(),
            roles: MemberRoles::of(chan, nick),
        })
    }

    /// Forget all channels and users, keeping our own record.
    pub fn clear(&mut self) {
        self.channels.clear();
        let me = self.me.as_deref().map(IrcKey::new);
        self.users.retain(|key, _| Some(key) == me.as_ref());
    }

    /// Whether every membership points at a live user record, every role
    /// holder is a member and every user is reachable.
    pub fn is_consistent(&self) -> bool {
        let members_have_users = self
            .channels
            .values()
            .all(|c| c.roles_consistent() && c.members().all(|n| self.user(n).is_some()));
        let users_reachable = self
            .users
            .values()
            .all(|u| self.is_me(&u.nick) || self.channels.values().any(|c| c.is_member(&u.nick)));
        members_have_users && users_reachable
    }
}
