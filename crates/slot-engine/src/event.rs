//! Raw calendar events as handed over by a calendar provider.
//!
//! The shape follows the Google Calendar v3 event resource closely enough
//! that a provider dump can be deserialized directly: `start`/`end` carry
//! either a `dateTime` or, for all-day events, a bare `date`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::interval::Interval;
use crate::time;

/// Busy/free display flag of a calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transparency {
    /// The event blocks time (calendar default).
    #[default]
    Opaque,
    /// The event is shown as free and never blocks a slot.
    Transparent,
}

/// Start or end of a calendar event, as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// An [`EventTime`] after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTime {
    Instant(DateTime<Utc>),
    AllDay(NaiveDate),
    /// Missing or unparseable.
    Malformed,
}

impl EventTime {
    /// A timed value, stored as RFC 3339 UTC.
    pub fn timed(instant: DateTime<Utc>) -> Self {
        Self {
            date_time: Some(instant.to_rfc3339_opts(SecondsFormat::Secs, true)),
            date: None,
        }
    }

    /// An all-day value.
    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            date_time: None,
            date: Some(date.format("%Y-%m-%d").to_string()),
        }
    }

    /// Parse the raw value.
    ///
    /// `dateTime` accepts RFC 3339 (`Z` or numeric offset) and naive
    /// `YYYY-MM-DDTHH:MM[:SS]`, the latter read as wall-clock time in `tz`.
    /// A `dateTime` holding only a date is treated like `date`.
    pub fn resolve(&self, tz: &Tz) -> ResolvedTime {
        if let Some(raw) = self.date_time.as_deref() {
            let raw = raw.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
                return ResolvedTime::Instant(dt.with_timezone(&Utc));
            }
            for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                    return ResolvedTime::Instant(time::local_to_utc(tz, naive));
                }
            }
            if !raw.contains('T') {
                if let Some(date) = parse_date(raw) {
                    return ResolvedTime::AllDay(date);
                }
            }
            return ResolvedTime::Malformed;
        }

        match self.date.as_deref().and_then(parse_date) {
            Some(date) => ResolvedTime::AllDay(date),
            None => ResolvedTime::Malformed,
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// A calendar event for a queried range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    /// Free-text label. Availability markers live here.
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default)]
    pub transparency: Transparency,
}

impl CalendarEvent {
    pub fn label(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }

    pub fn is_transparent(&self) -> bool {
        self.transparency == Transparency::Transparent
    }

    /// True when the start carries a bare date and no time of day.
    pub fn is_all_day(&self) -> bool {
        self.start
            .date_time
            .as_deref()
            .or(self.start.date.as_deref())
            .and_then(parse_date)
            .is_some()
    }

    /// Absolute span of the event, when both ends parse consistently.
    ///
    /// All-day events span local midnight of the start date to local
    /// midnight of the (exclusive) end date, and at least one day.
    pub fn span(&self, tz: &Tz) -> Option<Interval> {
        match (self.start.resolve(tz), self.end.resolve(tz)) {
            (ResolvedTime::Instant(start), ResolvedTime::Instant(end)) => Interval::new(start, end),
            (ResolvedTime::AllDay(first), ResolvedTime::AllDay(last)) => {
                let start = time::local_midnight(tz, first);
                let end = if last > first {
                    time::local_midnight(tz, last)
                } else {
                    Interval::day(first, tz).end()
                };
                Interval::new(start, end)
            }
            _ => None,
        }
    }
}

/// Payload for creating or replacing a calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
