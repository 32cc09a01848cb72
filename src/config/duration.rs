//! Durations written as (possibly fractional) seconds in TOML.

use std::time::Duration;

use serde::{Deserialize, Deserializer, de::Error};

/// Deserialize `0.2`, `60` or `"1.5"` into a [`Duration`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Int(u64),
        Float(f64),
        Text(String),
    }

    let secs = match Seconds::deserialize(deserializer)? {
        Seconds::Int(n) => return Ok(Duration::from_secs(n)),
        Seconds::Float(f) => f,
        Seconds::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid number of seconds: {s:?}")))?,
    };
    Duration::try_from_secs_f64(secs)
        .map_err(|_| D::Error::custom(format!("invalid number of seconds: {secs}")))
}
