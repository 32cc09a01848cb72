//! Login identity.

use serde::Deserialize;

use super::defaults::default_usermode;

/// Who to register as.
#[derive(Debug, Clone, Deserialize)]
pub struct Identity {
    /// Candidate nicknames, tried in order on collision.
    pub nicknames: Vec<String>,
    pub username: String,
    pub realname: String,
    /// The numeric mode field of `USER`.
    #[serde(default = "default_usermode")]
    pub usermode: String,
    /// Server password sent with `PASS`.
    #[serde(default)]
    pub password: Option<String>,
    /// SASL PLAIN credentials.
    #[serde(default)]
    pub sasl: Option<SaslCredentials>,
}

/// SASL PLAIN account and password.
#[derive(Clone, Deserialize)]
pub struct SaslCredentials {
    pub account: String,
    pub password: String,
}

impl std::fmt::Debug for SaslCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaslCredentials")
            .field("account", &self.account)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Identity {
    /// An identity with one nickname used for every field.
    pub fn new(nickname: impl Into<String>) -> Self {
        let nickname = nickname.into();
        Self {
            nicknames: vec![nickname.clone()],
            username: nickname.clone(),
            realname: nickname,
            usermode: default_usermode(),
            password: None,
            sasl: None,
        }
    }

    /// Replace the candidate nickname list.
    pub fn with_nicknames<I, S>(mut self, nicknames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nicknames = nicknames.into_iter().map(Into::into).collect();
        self
    }

    /// Attach SASL PLAIN credentials.
    pub fn with_sasl(mut self, account: impl Into<String>, password: impl Into<String>) -> Self {
        self.sasl = Some(SaslCredentials {
            account: account.into(),
            password: password.into(),
        });
        self
    }

    /// The first candidate nickname.
    pub fn primary_nickname(&self) -> Option<&str> {
        self.nicknames.first().map(String::as_str)
    }
}
