//! Serde adapter for the App Store's millisecond UNIX timestamps.
//!
//! Use as `#[serde(default, with = "millis_timestamp")]` on an
//! `Option<DateTime<Utc>>`. The App Store sends `0` for "not applicable", so
//! zero and negative values decode to `None` rather than to the epoch. `None`
//! encodes as `null`, never as `0`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn from_epoch_millis(value: i64) -> Option<DateTime<Utc>> {
    if value <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(value)
}

pub fn to_epoch_millis(value: Option<&DateTime<Utc>>) -> Option<i64> {
    value.map(DateTime::timestamp_millis)
}

pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match to_epoch_millis(value.as_ref()) {
        Some(millis) => serializer.serialize_some(&millis),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<i64> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(from_epoch_millis))
}
