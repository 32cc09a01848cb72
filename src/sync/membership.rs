//! Join, part, kick, quit, nick changes and the member-list replies.

use slirc_proto::casemap::IrcKey;
use slirc_proto::{IrcMessage, Priority, command};
use tracing::debug;

use super::{Joined, SyncContext, SyncOutput, Synchronizer};
use crate::event::{Event, WhoInfo};
use crate::state::{Role, split_name_prefix};
use crate::telemetry::spans;

/// Some servers relay every member of an anonymous (`+a`) channel under
/// this one prefix. Tracking it as a real user would merge them all.
fn is_anonymous(msg: &IrcMessage) -> bool {
    msg.nick() == Some("anonymous")
        && msg.ident() == Some("anonymous")
        && msg.host() == Some("anonymous.")
}

impl Synchronizer {
    pub(super) fn on_join(&mut self, msg: &IrcMessage, ctx: SyncContext, out: &mut SyncOutput) {
        let (Some(channel), Some(nick)) = (msg.channel(), msg.nick()) else {
            return;
        };
        let _span = spans::channel(channel).entered();

        if self.is_me(nick) {
            let key = self.pending_keys.remove(IrcKey::new(channel).as_str()).flatten();
            self.joined.insert(
                IrcKey::new(channel),
                Joined {
                    name: channel.to_owned(),
                    key: key.clone(),
                },
            );
            if self.tracking() {
                debug!("joined, requesting channel state");
                let extended = self.extended_roles();
                let chan = self.model.add_channel(channel, extended, ctx.now);
                chan.key = key;
                if let Some(me) = self.model.add_member(channel, nick) {
                    me.observe_prefix(msg.ident(), msg.host());
                }
                out.send(command::mode(channel, None), Priority::Medium);
                out.send(command::who(channel), Priority::Medium);
                out.send(command::mode(channel, Some("+b")), Priority::Medium);
            }
        } else if self.tracking() && !is_anonymous(msg) {
            if let Some(user) = self.model.add_member(channel, nick) {
                user.observe_prefix(msg.ident(), msg.host());
                out.send(command::who(nick), Priority::Medium);
            }
        }

        out.emit(Event::Join {
            channel: channel.to_owned(),
            nick: nick.to_owned(),
        });
    }

    pub(super) fn on_part(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let (Some(channel), Some(nick)) = (msg.channel(), msg.nick()) else {
            return;
        };
        let _span = spans::channel(channel).entered();

        if self.is_me(nick) {
            self.joined.remove(IrcKey::new(channel).as_str());
            if self.tracking() {
                debug!("left channel");
                self.model.remove_channel(channel);
            }
        } else if self.tracking() && !is_anonymous(msg) {
            self.model.remove_member(channel, nick);
        }

        out.emit(Event::Part {
            channel: channel.to_owned(),
            nick: nick.to_owned(),
            reason: msg.param(1).map(str::to_owned),
        });
    }

    pub(super) fn on_kick(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let (Some(channel), Some(target)) = (msg.channel(), msg.param(1)) else {
            return;
        };
        let _span = spans::channel(channel).entered();
        let by = msg.nick().unwrap_or_default().to_owned();

        if self.is_me(target) {
            let joined = self.joined.remove(IrcKey::new(channel).as_str());
            let key = self
                .model
                .remove_channel(channel)
                .and_then(|c| c.key)
                .or_else(|| joined.and_then(|j| j.key));
            debug!(by = %by, "kicked");
            if self.config.auto_rejoin_on_kick {
                self.note_join_request(channel, key.as_deref());
                out.send(command::join(channel, key.as_deref()), Priority::High);
            }
        } else if self.tracking() {
            self.model.remove_member(channel, target);
        }

        out.emit(Event::Kick {
            channel: channel.to_owned(),
            by,
            target: target.to_owned(),
            reason: msg.param(2).map(str::to_owned),
        });
    }

    pub(super) fn on_quit(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let Some(nick) = msg.nick() else {
            return;
        };
        if self.tracking() && !self.is_me(nick) {
            let left = self.model.remove_everywhere(nick);
            debug!(nick = %nick, channels = left.len(), "user quit");
        }
        out.emit(Event::Quit {
            nick: nick.to_owned(),
            reason: msg.text().map(str::to_owned),
        });
    }

    pub(super) fn on_nick(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let (Some(old), Some(new)) = (msg.nick(), msg.text()) else {
            return;
        };
        if self.is_me(old) {
            self.login.set_current(new);
            if !self.tracking() {
                self.model.set_me(new);
            }
        }
        if self.tracking() {
            let channels = self.model.rename(old, new);
            debug!(old = %old, new = %new, channels = channels.len(), "nick change");
        }
        out.emit(Event::NickChange {
            old: old.to_owned(),
            new: new.to_owned(),
        });
    }

    /// 353: `= #chan :@op +voice plain`
    pub(super) fn on_names(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let Some(channel) = msg.channel() else {
            return;
        };
        let names: Vec<String> = msg
            .text()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_owned)
            .collect();

        if self.tracking() && self.model.channel(channel).is_some() {
            let extended = self.extended_roles();
            for entry in &names {
                let (roles, nick) = split_name_prefix(entry, extended);
                if nick.is_empty() {
                    continue;
                }
                self.model.add_member(channel, nick);
                if let Some(chan) = self.model.channel_mut(channel) {
                    for role in roles {
                        chan.set_role(nick, role, true);
                    }
                }
            }
        }

        out.emit(Event::Names {
            channel: channel.to_owned(),
            names,
        });
    }

    /// 352: refresh the user and cross-check its roles.
    pub(super) fn on_who_reply(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let Some(who) = WhoInfo::from_message(msg) else {
            return;
        };
        if self.tracking() {
            self.apply_who(&who);
        }
        out.emit(Event::Who(who));
    }

    fn apply_who(&mut self, who: &WhoInfo) {
        if let Some(chan) = self.model.channel(&who.channel)
            && !chan.is_member(&who.nick)
        {
            self.model.add_member(&who.channel, &who.nick);
        }
        if let Some(user) = self.model.user_mut(&who.nick) {
            user.apply_who(who);
        }

        let extended = self.extended_roles();
        if let Some(chan) = self.model.channel_mut(&who.channel) {
            chan.set_role(&who.nick, Role::Op, who.op);
            chan.set_role(&who.nick, Role::Voice, who.voice);
            if extended {
                chan.set_role(&who.nick, Role::HalfOp, who.halfop);
                chan.set_role(&who.nick, Role::Admin, who.admin);
                chan.set_role(&who.nick, Role::Owner, who.owner);
            }
        }
    }

    /// 301: `me nick :message`
    pub(super) fn on_away_reply(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let Some(nick) = msg.param(1) else {
            return;
        };
        if self.tracking()
            && let Some(user) = self.model.user_mut(nick)
        {
            user.away = true;
        }
        out.emit(Event::Away {
            nick: nick.to_owned(),
            message: msg.param(2).unwrap_or_default().to_owned(),
        });
    }
}
