//! Channel/user state synchronizer.
//!
//! [`Synchronizer::handle`] consumes one classified inbound message and
//! returns the events it produced plus any follow-up lines to send. It does
//! no I/O and is only ever driven from the processing context, which makes
//! it the single writer of the membership [`Model`].
//!
//! Model maintenance is opt-in (`sync.active_channel_syncing`). With it
//! off, every message is still classified and emitted.

mod login;
mod membership;
mod modes;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use slirc_proto::casemap::IrcKey;
use slirc_proto::{
    Ctcp, IrcMessage, Isupport, MessageKind, ModeTable, Outgoing, Priority, ReplyCode,
};
use tracing::trace;

use crate::config::SyncConfig;
use crate::event::{ChannelInfo, Event};
use crate::state::Model;

pub use login::LoginState;

/// Inputs the synchronizer cannot observe itself.
#[derive(Debug, Clone, Copy)]
pub struct SyncContext {
    pub now: Instant,
    /// Current keepalive lag, reported with PONG events.
    pub lag: Duration,
}

impl SyncContext {
    pub fn now() -> Self {
        Self {
            now: Instant::now(),
            lag: Duration::ZERO,
        }
    }
}

/// What handling one message produced.
#[derive(Debug, Default)]
pub struct SyncOutput {
    pub events: Vec<Event>,
    pub outgoing: Vec<Outgoing>,
    /// Set when this message completed registration.
    pub registered: bool,
}

impl SyncOutput {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    fn send(&mut self, out: Outgoing, priority: Priority) {
        self.outgoing.push(out.with_priority(priority));
    }
}

/// A channel we are in, remembered for rejoining.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Joined {
    name: String,
    key: Option<String>,
}

pub struct Synchronizer {
    config: SyncConfig,
    model: Model,
    isupport: Isupport,
    mode_table: ModeTable,
    login: LoginState,
    /// Keys of JOINs we asked for and have not seen echoed yet.
    pending_keys: HashMap<IrcKey, Option<String>>,
    joined: HashMap<IrcKey, Joined>,
}

impl Synchronizer {
    pub fn new(config: SyncConfig) -> Self {
        let mode_table = ModeTable::new(config.extended_roles.unwrap_or(false));
        Self {
            config,
            model: Model::new(),
            isupport: Isupport::default(),
            mode_table,
            login: LoginState::default(),
            pending_keys: HashMap::new(),
            joined: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn isupport(&self) -> &Isupport {
        &self.isupport
    }

    fn tracking(&self) -> bool {
        self.config.active_channel_syncing
    }

    /// Whether half-op, admin and owner are tracked.
    pub fn extended_roles(&self) -> bool {
        self.mode_table.extended_roles()
    }

    /// Our current nickname: the registered one, or the one being tried.
    pub fn nickname(&self) -> Option<&str> {
        self.model.me().or_else(|| self.login.current())
    }

    pub fn is_me(&self, nick: &str) -> bool {
        match self.nickname() {
            Some(me) => slirc_proto::irc_eq(me, nick),
            None => false,
        }
    }

    /// Channels we are in, by name as joined.
    pub fn joined_channels(&self) -> Vec<String> {
        self.joined.values().map(|j| j.name.clone()).collect()
    }

    pub fn is_joined(&self, channel: &str) -> bool {
        self.joined.contains_key(IrcKey::new(channel).as_str())
    }

    /// Remember the key of a JOIN we are about to send.
    pub fn note_join_request(&mut self, channel: &str, key: Option<&str>) {
        self.pending_keys
            .insert(IrcKey::new(channel), key.map(str::to_owned));
    }

    /// Every channel we are in with the best known key, for rejoining.
    ///
    /// A key seen in a channel MODE wins over the one we joined with.
    pub fn rejoin_targets(&self) -> Vec<(String, Option<String>)> {
        self.joined
            .values()
            .map(|j| {
                let key = self
                    .model
                    .channel(&j.name)
                    .and_then(|c| c.key.clone())
                    .or_else(|| j.key.clone());
                (j.name.clone(), key)
            })
            .collect()
    }

    /// Forget everything tied to the current server session.
    pub fn reset_session(&mut self) {
        self.model = Model::new();
        self.isupport.clear();
        self.refresh_mode_table();
        self.login.reset();
        self.pending_keys.clear();
        self.joined.clear();
    }

    fn refresh_mode_table(&mut self) {
        let extended = self
            .config
            .extended_roles
            .unwrap_or_else(|| self.isupport.supports_extended_roles());
        self.mode_table = ModeTable::new(extended).with_chanmodes(self.isupport.chanmodes());
    }

    /// Process one inbound message.
    pub fn handle(&mut self, msg: &Arc<IrcMessage>, ctx: SyncContext) -> SyncOutput {
        let mut out = SyncOutput::default();
        out.emit(Event::Raw(Arc::clone(msg)));
        trace!(kind = ?msg.kind(), command = msg.command(), "sync");

        if let Some(code) = msg.reply_code() {
            self.handle_numeric(msg, code, ctx, &mut out);
        } else {
            self.handle_command(msg, ctx, &mut out);
        }
        out
    }

    fn handle_numeric(
        &mut self,
        msg: &IrcMessage,
        code: ReplyCode,
        ctx: SyncContext,
        out: &mut SyncOutput,
    ) {
        let text = || msg.text().unwrap_or_default().to_owned();
        match code {
            ReplyCode::RPL_WELCOME => self.on_welcome(msg, out),
            ReplyCode::RPL_ISUPPORT => {
                let params: Vec<&str> =
                    (0..msg.param_count()).filter_map(|i| msg.param(i)).collect();
                self.isupport.absorb(&params);
                self.refresh_mode_table();
            }
            ReplyCode::RPL_UMODEIS => self.on_usermode_reply(msg, out),
            ReplyCode::RPL_AWAY => self.on_away_reply(msg, out),
            ReplyCode::RPL_UNAWAY => out.emit(Event::Unaway),
            ReplyCode::RPL_NOWAWAY => out.emit(Event::NowAway),
            ReplyCode::RPL_WHOREPLY => self.on_who_reply(msg, out),
            ReplyCode::RPL_ENDOFWHO => out.emit(Event::WhoEnd {
                mask: msg.param(1).unwrap_or_default().to_owned(),
            }),
            ReplyCode::RPL_LIST => {
                if let Some(info) = ChannelInfo::from_message(msg) {
                    out.emit(Event::ListItem(info));
                }
            }
            ReplyCode::RPL_LISTEND => out.emit(Event::ListEnd),
            ReplyCode::RPL_CHANNELMODEIS => self.on_channel_mode_reply(msg, out),
            ReplyCode::RPL_NOTOPIC | ReplyCode::RPL_TOPIC => self.on_topic_reply(msg, code, out),
            ReplyCode::RPL_NAMREPLY => self.on_names(msg, out),
            ReplyCode::RPL_ENDOFNAMES => {
                if let Some(channel) = msg.channel() {
                    out.emit(Event::ChannelPassiveSynced {
                        channel: channel.to_owned(),
                    });
                }
            }
            ReplyCode::RPL_BANLIST => self.on_ban_entry(msg, out),
            ReplyCode::RPL_ENDOFBANLIST => {
                if let Some(channel) = msg.channel() {
                    out.emit(Event::BanListEnd {
                        channel: channel.to_owned(),
                    });
                    self.mark_synced(channel, ctx.now, out);
                }
            }
            ReplyCode::RPL_MOTD | ReplyCode::RPL_MOTDSTART | ReplyCode::RPL_ENDOFMOTD => {
                out.emit(Event::Motd { line: text() });
            }
            ReplyCode::RPL_SASLSUCCESS => self.on_sasl_done(true, out),
            ReplyCode::ERR_SASLFAIL
            | ReplyCode::ERR_SASLTOOLONG
            | ReplyCode::ERR_SASLABORTED
            | ReplyCode::ERR_SASLALREADY => self.on_sasl_done(false, out),
            _ => {}
        }

        if code.is_error() {
            match code {
                ReplyCode::ERR_NICKNAMEINUSE | ReplyCode::ERR_ERRONEUSNICKNAME => {
                    self.on_nick_rejected(out);
                }
                ReplyCode::ERR_NOCHANMODES => {
                    if let Some(channel) = msg.channel() {
                        self.mark_synced(channel, ctx.now, out);
                    }
                }
                _ => {}
            }
            out.emit(Event::ErrorMessage { code, text: text() });
        }
    }

    fn handle_command(&mut self, msg: &IrcMessage, ctx: SyncContext, out: &mut SyncOutput) {
        let from = msg.nick().unwrap_or_default().to_owned();
        let text = msg.text().unwrap_or_default().to_owned();

        match msg.kind() {
            MessageKind::Ping => {
                out.send(slirc_proto::command::pong(&text), Priority::Critical);
                out.emit(Event::Ping { token: text });
            }
            MessageKind::Pong => out.emit(Event::Pong { lag: ctx.lag }),
            MessageKind::Error => out.emit(Event::Error { message: text }),
            MessageKind::Join => self.on_join(msg, ctx, out),
            MessageKind::Part => self.on_part(msg, out),
            MessageKind::Kick => self.on_kick(msg, out),
            MessageKind::Quit => self.on_quit(msg, out),
            MessageKind::NickChange => self.on_nick(msg, out),
            MessageKind::TopicChange => self.on_topic_change(msg, out),
            MessageKind::Invite => out.emit(Event::Invite {
                channel: msg.param(1).unwrap_or_default().to_owned(),
                by: from,
            }),
            MessageKind::UserModeChange => self.on_user_mode_change(msg, out),
            MessageKind::ChannelModeChange => self.on_channel_mode_change(msg, out),
            MessageKind::ChannelMessage
            | MessageKind::ChannelAction
            | MessageKind::ChannelNotice
            | MessageKind::QueryMessage
            | MessageKind::QueryAction
            | MessageKind::QueryNotice
            | MessageKind::CtcpRequest
            | MessageKind::CtcpReply => self.on_message(msg, from, text, out),
            _ => match msg.command() {
                "CAP" => self.on_cap(msg, out),
                "AUTHENTICATE" => self.on_authenticate(msg, out),
                _ => {}
            },
        }
    }

    fn on_message(&mut self, msg: &IrcMessage, from: String, text: String, out: &mut SyncOutput) {
        if self.tracking()
            && let Some(user) = self.model.user_mut(&from)
        {
            user.observe_prefix(msg.ident(), msg.host());
        }

        let channel = || msg.channel().unwrap_or_default().to_owned();
        let ctcp_body = || {
            Ctcp::parse(&text)
                .and_then(|c| c.params)
                .unwrap_or_default()
                .to_owned()
        };
        let event = match msg.kind() {
            MessageKind::ChannelMessage => Event::ChannelMessage {
                channel: channel(),
                from,
                text,
            },
            MessageKind::ChannelNotice => Event::ChannelNotice {
                channel: channel(),
                from,
                text,
            },
            MessageKind::ChannelAction => Event::ChannelAction {
                channel: channel(),
                from,
                text: ctcp_body(),
            },
            MessageKind::QueryMessage => Event::QueryMessage { from, text },
            MessageKind::QueryNotice => Event::QueryNotice { from, text },
            MessageKind::QueryAction => Event::QueryAction {
                text: ctcp_body(),
                from,
            },
            kind => {
                let Some(ctcp) = Ctcp::parse(&text) else {
                    return;
                };
                let target = msg.param(0).unwrap_or_default().to_owned();
                let params = ctcp.params.map(str::to_owned);
                if kind == MessageKind::CtcpReply {
                    Event::CtcpReply {
                        from,
                        target,
                        kind: ctcp.kind,
                        params,
                    }
                } else {
                    Event::CtcpRequest {
                        from,
                        target,
                        kind: ctcp.kind,
                        params,
                    }
                }
            }
        };
        out.emit(event);
    }

    fn mark_synced(&mut self, channel: &str, now: Instant, out: &mut SyncOutput) {
        if !self.tracking() {
            return;
        }
        let Some(chan) = self.model.channel_mut(channel) else {
            return;
        };
        if let Some(duration) = chan.mark_synced(now) {
            let _span = crate::telemetry::spans::channel(&chan.name).entered();
            tracing::debug!(duration_ms = duration.as_millis() as u64, "channel synced");
            out.emit(Event::ChannelActiveSynced {
                channel: chan.name.clone(),
                duration,
            });
        }
    }
}
