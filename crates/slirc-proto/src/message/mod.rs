//! The inbound message record.
//!
//! An [`IrcMessage`] is built once per received line and never mutated.
//! It carries the decomposed prefix, the command or numeric code, the
//! positional arguments, the trailing payload, the raw line, the semantic
//! [`MessageKind`] and the channel name when the kind carries one.

mod parse;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::classify::{channel_position, classify, MessageKind};
use crate::error::ProtocolError;
use crate::prefix::Prefix;
use crate::reply::ReplyCode;

use self::parse::ParsedLine;

/// A parsed, classified inbound line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrcMessage {
    raw: String,
    prefix: Option<Prefix>,
    command: String,
    reply: Option<ReplyCode>,
    args: Vec<String>,
    trailing: Option<String>,
    kind: MessageKind,
    channel: Option<String>,
    received_at: DateTime<Utc>,
}

impl IrcMessage {
    /// Parse and classify a raw line. A trailing CR/LF is ignored.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let stripped = line.trim_end_matches(['\r', '\n']);
        let invalid = |cause| ProtocolError::InvalidMessage {
            string: line.to_owned(),
            cause,
        };

        let parsed = ParsedLine::parse(stripped).map_err(invalid)?;
        let prefix = parsed.prefix.map(Prefix::parse).transpose().map_err(invalid)?;
        let reply = ReplyCode::from_command(parsed.command);

        let mut params: Vec<&str> = parsed.args.to_vec();
        if let Some(trailing) = parsed.trailing {
            params.push(trailing);
        }

        let kind = classify(reply, parsed.command, &params);
        let channel = channel_position(kind, reply)
            .and_then(|index| params.get(index))
            .map(|name| (*name).to_owned());

        Ok(Self {
            raw: stripped.to_owned(),
            prefix,
            command: parsed.command.to_owned(),
            reply,
            args: parsed.args.iter().map(|a| (*a).to_owned()).collect(),
            trailing: parsed.trailing.map(str::to_owned),
            kind,
            channel,
            received_at: Utc::now(),
        })
    }

    /// The line as received, without the line terminator.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The sender prefix, if the line had one.
    pub fn prefix(&self) -> Option<&Prefix> {
        self.prefix.as_ref()
    }

    /// The sender nickname (or server name).
    pub fn nick(&self) -> Option<&str> {
        self.prefix.as_ref().map(Prefix::nick)
    }

    /// The sender ident, if known.
    pub fn ident(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::ident)
    }

    /// The sender host, if known.
    pub fn host(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::host)
    }

    /// Whether the line came from a server rather than a user.
    pub fn from_server(&self) -> bool {
        self.prefix.as_ref().is_some_and(Prefix::is_server)
    }

    /// The command word, or the numeric code as its three digits.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The numeric code, for numeric replies.
    pub fn reply_code(&self) -> Option<ReplyCode> {
        self.reply
    }

    /// Positional arguments, excluding the trailing payload.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// One positional argument.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// The trailing payload, if present.
    pub fn trailing(&self) -> Option<&str> {
        self.trailing.as_deref()
    }

    /// The parameter at `index` counting the trailing payload as the last
    /// parameter.
    pub fn param(&self, index: usize) -> Option<&str> {
        match index.cmp(&self.args.len()) {
            std::cmp::Ordering::Less => self.arg(index),
            std::cmp::Ordering::Equal => self.trailing(),
            std::cmp::Ordering::Greater => None,
        }
    }

    /// Number of parameters, counting the trailing payload.
    pub fn param_count(&self) -> usize {
        self.args.len() + usize::from(self.trailing.is_some())
    }

    /// The last parameter: the trailing payload, or else the last argument.
    ///
    /// This is where message bodies, quit reasons and similar text live.
    pub fn text(&self) -> Option<&str> {
        self.trailing().or_else(|| self.args.last().map(String::as_str))
    }

    /// The semantic classification.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// The channel name, for kinds that carry one.
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// When the line was parsed.
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

impl FromStr for IrcMessage {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for IrcMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
