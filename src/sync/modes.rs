//! Mode changes, topics and the ban list.

use slirc_proto::mode::{apply_flags, set_flag};
use slirc_proto::{IrcMessage, ModeChange, ReplyCode};
use tracing::debug;

use super::{SyncOutput, Synchronizer};
use crate::event::{BanInfo, Event};
use crate::state::Role;

/// Parameters from index `start` on, counting the trailing payload.
fn params_from(msg: &IrcMessage, start: usize) -> Vec<&str> {
    (start..msg.param_count()).filter_map(|i| msg.param(i)).collect()
}

impl Synchronizer {
    /// 221: our full user mode.
    pub(super) fn on_usermode_reply(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let modes = params_from(msg, 1).join(" ");
        self.model.usermode.clear();
        apply_flags(&mut self.model.usermode, &modes);
        out.emit(Event::UserModeChange { modes });
    }

    /// `MODE nick :+i`
    pub(super) fn on_user_mode_change(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let Some(target) = msg.param(0) else {
            return;
        };
        let modes = params_from(msg, 1).join(" ");
        if self.is_me(target) {
            apply_flags(&mut self.model.usermode, &modes);
        }
        out.emit(Event::UserModeChange { modes });
    }

    /// `MODE #chan +ov-b alice bob *!*@spam`
    pub(super) fn on_channel_mode_change(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let (Some(channel), Some(modes)) = (msg.channel(), msg.param(1)) else {
            return;
        };
        let by = msg.nick().unwrap_or_default();
        let params = params_from(msg, 2);

        out.emit(Event::ChannelModeChange {
            channel: channel.to_owned(),
            by: by.to_owned(),
            modes: params_from(msg, 1).join(" "),
        });

        let changes = self.mode_table.parse(modes, &params);
        self.apply_mode_changes(channel, by, &changes, out);
    }

    /// 324: `me #chan +ntk key`. Replaces the stored mode string.
    pub(super) fn on_channel_mode_reply(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let Some(channel) = msg.channel() else {
            return;
        };
        let modes = msg.param(2).unwrap_or_default();
        let params = params_from(msg, 3);

        if self.tracking()
            && let Some(chan) = self.model.channel_mut(channel)
        {
            chan.mode.clear();
            chan.key = None;
            chan.user_limit = None;
        }
        let changes = self.mode_table.parse(modes, &params);
        self.apply_mode_changes(channel, "", &changes, out);

        out.emit(Event::ChannelMode {
            channel: channel.to_owned(),
            modes: params_from(msg, 2).join(" "),
        });
    }

    fn apply_mode_changes(
        &mut self,
        channel: &str,
        by: &str,
        changes: &[ModeChange<'_>],
        out: &mut SyncOutput,
    ) {
        let extended = self.extended_roles();
        let tracking = self.tracking();

        for change in changes {
            if let Some(role) = Role::from_mode(change.mode, extended) {
                let Some(target) = change.param else {
                    continue;
                };
                if tracking && let Some(chan) = self.model.channel_mut(channel) {
                    chan.set_role(target, role, change.adding);
                }
                out.emit(Event::RoleChange {
                    channel: channel.to_owned(),
                    by: by.to_owned(),
                    target: target.to_owned(),
                    role,
                    granted: change.adding,
                });
                continue;
            }

            if change.mode == 'b'
                && let Some(mask) = change.param
            {
                if tracking && let Some(chan) = self.model.channel_mut(channel) {
                    if change.adding {
                        chan.bans.insert(mask.to_owned());
                    } else {
                        chan.bans.remove(mask);
                    }
                }
                out.emit(Event::Ban {
                    channel: channel.to_owned(),
                    by: by.to_owned(),
                    mask: mask.to_owned(),
                    added: change.adding,
                });
                continue;
            }

            if !tracking {
                continue;
            }
            let Some(chan) = self.model.channel_mut(channel) else {
                continue;
            };
            match (change.mode, change.param) {
                ('k', key) => chan.key = key.filter(|_| change.adding).map(str::to_owned),
                ('l', limit) => {
                    chan.user_limit =
                        limit.filter(|_| change.adding).and_then(|l| l.parse().ok());
                }
                // Exception lists and server-specific parameter modes are
                // not tracked.
                (_, Some(_)) => {}
                (mode, None) => set_flag(&mut chan.mode, mode, change.adding),
            }
        }
    }

    /// 331 and 332.
    pub(super) fn on_topic_reply(
        &mut self,
        msg: &IrcMessage,
        code: ReplyCode,
        out: &mut SyncOutput,
    ) {
        let Some(channel) = msg.channel() else {
            return;
        };
        let topic = (code == ReplyCode::RPL_TOPIC)
            .then(|| msg.param(2).unwrap_or_default().to_owned());
        if self.tracking()
            && let Some(chan) = self.model.channel_mut(channel)
        {
            chan.topic.clone_from(&topic);
        }
        out.emit(Event::Topic {
            channel: channel.to_owned(),
            topic,
        });
    }

    /// `TOPIC #chan :new topic`
    pub(super) fn on_topic_change(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let Some(channel) = msg.channel() else {
            return;
        };
        let topic = msg.param(1).unwrap_or_default().to_owned();
        if self.tracking()
            && let Some(chan) = self.model.channel_mut(channel)
        {
            debug!(channel = %channel, "topic changed");
            chan.topic = Some(topic.clone());
        }
        out.emit(Event::TopicChange {
            channel: channel.to_owned(),
            by: msg.nick().unwrap_or_default().to_owned(),
            topic,
        });
    }

    /// 367
    pub(super) fn on_ban_entry(&mut self, msg: &IrcMessage, out: &mut SyncOutput) {
        let Some(ban) = BanInfo::from_message(msg) else {
            return;
        };
        if self.tracking()
            && let Some(chan) = self.model.channel_mut(&ban.channel)
        {
            chan.bans.insert(ban.mask.clone());
        }
        out.emit(Event::BanListEntry(ban));
    }
}
