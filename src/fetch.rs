//! Blocking list fetches.
//!
//! A fetch sends one query and waits on a oneshot until the matching
//! end-of-list reply arrives. Each list type has its own slot; a second
//! fetch of the same type waits for the first to finish. Items are fed
//! from the synchronizer's events by the processing context.
//!
//! ```text
//!   caller ── run() ──▶ [guard] ── send query ──▶ rx.await
//!                                                    ▲
//!   processing ── observe(events) ── push/finish ────┘
//!   disconnect ── abort_all() ── drop tx ──▶ FetchAborted
//! ```

use parking_lot::Mutex;
use slirc_proto::irc_eq;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::event::{BanInfo, ChannelInfo, Event, WhoInfo};

struct Pending<T> {
    /// Channel or mask the end-of-list reply must name. `None` matches any.
    key: Option<String>,
    items: Vec<T>,
    done: oneshot::Sender<Vec<T>>,
}

impl<T> Pending<T> {
    fn matches(&self, key: &str) -> bool {
        self.key.as_deref().is_none_or(|k| irc_eq(k, key))
    }
}

/// One outstanding fetch of a single list type.
pub(crate) struct FetchSlot<T> {
    name: &'static str,
    guard: tokio::sync::Mutex<()>,
    pending: Mutex<Option<Pending<T>>>,
}

impl<T> FetchSlot<T> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            guard: tokio::sync::Mutex::new(()),
            pending: Mutex::new(None),
        }
    }

    /// Arm the slot, run `send`, and wait for the list.
    pub(crate) async fn run<F>(&self, key: Option<&str>, send: F) -> Result<Vec<T>>
    where
        F: Future<Output = Result<()>>,
    {
        let _guard = self.guard.lock().await;
        let (done, rx) = oneshot::channel();
        *self.pending.lock() = Some(Pending {
            key: key.map(str::to_owned),
            items: Vec::new(),
            done,
        });

        if let Err(e) = send.await {
            self.pending.lock().take();
            return Err(e);
        }
        debug!(list = self.name, key = ?key, "fetch started");
        rx.await.map_err(|_| ClientError::FetchAborted)
    }

    fn push(&self, key: Option<&str>, item: T) {
        self.push_if(|p| key.is_none_or(|k| p.matches(k)), item);
    }

    fn push_if(&self, accept: impl FnOnce(&Pending<T>) -> bool, item: T) {
        let mut pending = self.pending.lock();
        if let Some(p) = pending.as_mut()
            && accept(p)
        {
            p.items.push(item);
        }
    }

    fn finish(&self, key: Option<&str>) {
        let mut pending = self.pending.lock();
        if pending
            .as_ref()
            .is_some_and(|p| key.is_none_or(|k| p.matches(k)))
            && let Some(p) = pending.take()
        {
            debug!(list = self.name, items = p.items.len(), "fetch complete");
            // The caller may have given up; nothing to do then.
            let _ = p.done.send(p.items);
        }
    }

    fn abort(&self) -> bool {
        self.pending.lock().take().is_some()
    }
}

/// Whether a WHO reply answers a query for `mask`. Wildcard masks accept
/// every reply; otherwise the reply must name the mask as its channel or
/// its nickname.
fn who_matches(mask: Option<&str>, info: &WhoInfo) -> bool {
    match mask {
        None => true,
        Some(mask) if mask.contains(['*', '?']) => true,
        Some(mask) => irc_eq(mask, &info.channel) || irc_eq(mask, &info.nick),
    }
}

/// The three fetchable lists.
pub(crate) struct Fetches {
    pub(crate) list: FetchSlot<ChannelInfo>,
    pub(crate) who: FetchSlot<WhoInfo>,
    pub(crate) bans: FetchSlot<BanInfo>,
}

impl Default for Fetches {
    fn default() -> Self {
        Self {
            list: FetchSlot::new("list"),
            who: FetchSlot::new("who"),
            bans: FetchSlot::new("bans"),
        }
    }
}

impl Fetches {
    /// Feed the events produced by one inbound message.
    pub(crate) fn observe(&self, events: &[Event]) {
        for event in events {
            match event {
                Event::ListItem(info) => self.list.push(None, info.clone()),
                Event::ListEnd => self.list.finish(None),
                Event::Who(info) => self
                    .who
                    .push_if(|p| who_matches(p.key.as_deref(), info), info.clone()),
                Event::WhoEnd { mask } => self.who.finish(Some(mask.as_str())),
                Event::BanListEntry(ban) => self.bans.push(Some(ban.channel.as_str()), ban.clone()),
                Event::BanListEnd { channel } => self.bans.finish(Some(channel.as_str())),
                _ => {}
            }
        }
    }

    /// Release every waiting fetch with [`ClientError::FetchAborted`].
    pub(crate) fn abort_all(&self) {
        let aborted = [self.list.abort(), self.who.abort(), self.bans.abort()]
            .into_iter()
            .filter(|a| *a)
            .count();
        if aborted > 0 {
            debug!(aborted, "outstanding fetches released");
        }
    }
}
