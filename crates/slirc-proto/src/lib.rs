//! # slirc-proto
//!
//! Line framing, message parsing and classification for the slirc IRC
//! client.
//!
//! ## Features
//!
//! - CRLF line framing with configurable text encoding (tokio codec)
//! - Prefix decomposition into nickname, ident and host
//! - Immutable inbound [`IrcMessage`] records with a semantic [`MessageKind`]
//! - CTCP envelope handling
//! - A mode-string interpreter that pairs mode letters with their parameters
//! - A stateless command formatter producing priority-tagged [`Outgoing`] lines
//!
//! ## Quick Start
//!
//! ```rust
//! use slirc_proto::{IrcMessage, MessageKind};
//!
//! let msg = IrcMessage::parse(":nick!user@host PRIVMSG #rust :Hello!").unwrap();
//! assert_eq!(msg.kind(), MessageKind::ChannelMessage);
//! assert_eq!(msg.channel(), Some("#rust"));
//! assert_eq!(msg.nick(), Some("nick"));
//! assert_eq!(msg.trailing(), Some("Hello!"));
//! ```
//!
//! ## Acknowledgments
//!
//! This project was inspired by the architectural patterns established by
//! [Aaron Weiss (aatxe)](https://github.com/aatxe) in the
//! [irc](https://github.com/aatxe/irc) crate.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod classify;
pub mod command;
pub mod ctcp;
pub mod error;
pub mod isupport;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod mode;
pub mod prefix;
pub mod reply;

pub use self::casemap::{irc_eq, irc_lower_char, irc_to_lower};
pub use self::classify::{is_channel_name, MessageKind, CHANNEL_PREFIXES};
pub use self::command::{Outgoing, Priority};
pub use self::ctcp::{Ctcp, CtcpKind};
pub use self::error::{MessageParseError, ProtocolError};
pub use self::isupport::{Isupport, PrefixSpec};
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
pub use self::message::IrcMessage;
pub use self::mode::{ModeChange, ModeTable};
pub use self::prefix::Prefix;
pub use self::reply::ReplyCode;
