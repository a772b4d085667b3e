//! Wall-clock timestamps as persisted in message records

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StoreError;

/// A UTC instant with millisecond precision.
///
/// Records carry their creation time as an ISO-8601 string
/// (`2024-12-01T10:15:30.123Z`). Precision is truncated to milliseconds on
/// construction so a value always round-trips through the store unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current client time.
    ///
    /// This is the sender's clock, not the server's; skew between devices shows up
    /// directly in display order.
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(3))
    }

    /// Builds a timestamp from milliseconds since the Unix epoch.
    pub fn from_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Self)
    }

    /// Milliseconds since the Unix epoch
    pub fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Borrow the underlying chrono value
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// ISO-8601 rendering with millisecond precision and a `Z` suffix
    pub fn to_iso_string(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.trunc_subsecs(3))
    }
}

impl FromStr for Timestamp {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self::from(dt.with_timezone(&Utc)))
            .map_err(|e| StoreError::Deserialization(format!("invalid timestamp {s:?}: {e}")))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_iso_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
