//! Business-timezone helpers.
//!
//! All interval math happens on the absolute UTC timeline. These helpers are
//! the only place where wall-clock values of the business timezone are turned
//! into instants, or instants back into `HH:MM` strings for display.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::{EngineError, Result};

/// Parse an IANA timezone name (e.g. "Asia/Kolkata").
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| EngineError::InvalidTimezone(name.to_string()))
}

/// Resolve a wall-clock time in `tz` to an absolute instant.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times that
/// fall in a DST gap are shifted forward by one hour.
pub fn local_to_utc(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = local + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&local))
        }
    }
}

/// Local midnight of `date` in `tz`, as an absolute instant.
pub fn local_midnight(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    local_to_utc(tz, date.and_time(NaiveTime::MIN))
}

/// Wall-clock time of `instant` in `tz`, truncated to the minute.
pub fn local_time(tz: &Tz, instant: DateTime<Utc>) -> NaiveTime {
    let local = instant.with_timezone(tz).time();
    local.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(local)
}

/// Calendar date of `instant` in `tz`.
pub fn local_date(tz: &Tz, instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Format a time as `HH:MM`.
pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

const END_OF_DAY: &str = "24:00";

/// Format the end bound of an interval that lies within one day.
///
/// Such an end can only sit on local midnight when it is the end of the day,
/// so midnight is written `24:00`.
pub fn format_end_hhmm(time: NaiveTime) -> String {
    if time == NaiveTime::MIN {
        END_OF_DAY.to_string()
    } else {
        format_hhmm(time)
    }
}

/// Parse `HH:MM` (seconds are tolerated and ignored). `24:00` reads as
/// midnight.
pub fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    if raw == END_OF_DAY {
        return Some(NaiveTime::MIN);
    }
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
        .and_then(|t| t.with_second(0))
}

/// Serde adapter that stores a [`NaiveTime`] as an `HH:MM` string.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hhmm(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_hhmm(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid HH:MM time: {raw}")))
    }
}

/// Like [`hhmm`], for end bounds: midnight is stored as `24:00`.
pub mod hhmm_end {
    use chrono::NaiveTime;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_end_hhmm(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        super::hhmm::deserialize(deserializer)
    }
}
