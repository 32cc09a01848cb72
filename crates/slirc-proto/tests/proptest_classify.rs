//! Property-based tests for parsing and classification.
//!
//! Uses proptest to generate random IRC components and verify that:
//! 1. Parsing never panics on arbitrary input
//! 2. Classification and channel extraction depend only on the command and
//!    parameter shape
//! 3. Prefix decomposition recovers its components

use proptest::prelude::*;
use slirc_proto::{IrcMessage, MessageKind, ModeChange, ModeTable, Prefix};

fn nickname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z\\[\\]\\\\^_`{|}][a-zA-Z0-9\\-\\[\\]\\\\^_`{|}]{0,8}")
        .expect("valid regex")
}

fn username_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("~?[a-zA-Z][a-zA-Z0-9]{0,9}").expect("valid regex")
}

fn hostname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9]+(\\.[a-z0-9]+)*").expect("valid regex")
}

fn channel_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[#&][a-zA-Z0-9_\\-]{1,49}").expect("valid regex")
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^\r\n\0\x01]{0,200}").expect("valid regex")
}

fn channel_command_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("PRIVMSG"),
        Just("NOTICE"),
        Just("PART"),
        Just("TOPIC"),
        Just("JOIN"),
    ]
}

proptest! {
    #[test]
    fn parse_never_panics(line in "\\PC{0,300}") {
        let _ = IrcMessage::parse(&line);
    }

    #[test]
    fn classification_is_deterministic(
        nick in nickname_strategy(),
        ident in username_strategy(),
        host in hostname_strategy(),
        command in channel_command_strategy(),
        channel in channel_strategy(),
        text_a in text_strategy(),
        text_b in text_strategy(),
    ) {
        let a = IrcMessage::parse(&format!(":{nick}!{ident}@{host} {command} {channel} :{text_a}")).unwrap();
        let b = IrcMessage::parse(&format!(":{nick}!{ident}@{host} {command} {channel} :{text_b}")).unwrap();
        prop_assert_eq!(a.kind(), b.kind());
        prop_assert_eq!(a.channel(), b.channel());
        prop_assert_eq!(a.channel(), Some(channel.as_str()));
    }

    #[test]
    fn numeric_classification_is_stable(code in 0u16..1000, target in nickname_strategy(), text in text_strategy()) {
        let line = format!(":irc.example.net {code:03} {target} #chan :{text}");
        let first = IrcMessage::parse(&line).unwrap();
        let second = IrcMessage::parse(&line).unwrap();
        prop_assert_eq!(first.kind(), second.kind());
        prop_assert_eq!(first.channel(), second.channel());
        if (400..600).contains(&code) && code != 477 {
            prop_assert_eq!(first.kind(), MessageKind::ErrorMessage);
        }
    }

    #[test]
    fn prefix_components_recovered(
        nick in nickname_strategy(),
        ident in username_strategy(),
        host in hostname_strategy(),
    ) {
        let prefix = Prefix::parse(&format!("{nick}!{ident}@{host}")).unwrap();
        prop_assert_eq!(prefix.nick(), nick.as_str());
        prop_assert_eq!(prefix.ident(), Some(ident.as_str()));
        prop_assert_eq!(prefix.host(), Some(host.as_str()));
    }

    #[test]
    fn op_then_deop_pairs_parameters(nicks in prop::collection::vec(nickname_strategy(), 1..6)) {
        let table = ModeTable::default();
        let modes = format!("+{}", "o".repeat(nicks.len()));
        let params: Vec<&str> = nicks.iter().map(String::as_str).collect();

        let changes = table.parse(&modes, &params);
        prop_assert_eq!(changes.len(), nicks.len());
        for (change, nick) in changes.iter().zip(&nicks) {
            prop_assert_eq!(*change, ModeChange::add('o', Some(nick.as_str())));
        }
    }
}
