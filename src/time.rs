// Timestamp codec: the wire carries epoch milliseconds, the domain works with
// local date-times. Older data endpoints send plain `YYYY-MM-DD` strings.

use chrono::{DateTime, Local, NaiveDate, TimeZone};

use crate::error::{Error, Result};

/// Format used by the date-only fields of the data service.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Encode a local time as epoch milliseconds.
pub fn to_millis(time: &DateTime<Local>) -> i64 {
    time.timestamp_millis()
}

/// Decode epoch milliseconds into a local time.
pub fn from_millis(millis: i64) -> Result<DateTime<Local>> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .ok_or(Error::InvalidTimestamp(millis))
}

/// Current local time as epoch milliseconds.
pub fn now_millis() -> i64 {
    to_millis(&Local::now())
}

/// Parse the older date-only string format.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| Error::InvalidDate(value.to_string()))
}

/// `#[serde(with = "crate::time::millis")]` for `DateTime<Local>` fields.
pub mod millis {
    use chrono::{DateTime, Local};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(super::to_millis(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Local>, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        super::from_millis(millis).map_err(de::Error::custom)
    }
}

/// `#[serde(default, with = "crate::time::date_only")]` for optional dates.
pub mod date_only {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.collect_str(&date.format(super::DATE_FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::parse_date(&raw).map_err(de::Error::custom))
            .transpose()
    }
}
