//! Partition a day's calendar events into availability and busy blocks.
//!
//! Availability is stored in the calendar as ordinary events whose label
//! carries a marker string. [`AvailabilityKind::from_label`] and
//! [`AvailabilityKind::marker`] are the only places that know the markers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::event::{CalendarEvent, EventTime, ResolvedTime};
use crate::interval::Interval;
use crate::time;

pub const REGULAR_MARKER: &str = "REGULAR_TIMING";
pub const EMERGENCY_MARKER: &str = "EMERGENCY_TIMING";

/// Kind of an operator-declared availability window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityKind {
    Regular,
    Emergency,
}

impl AvailabilityKind {
    /// Marker written into the label of the calendar event backing a window.
    pub fn marker(self) -> &'static str {
        match self {
            AvailabilityKind::Regular => REGULAR_MARKER,
            AvailabilityKind::Emergency => EMERGENCY_MARKER,
        }
    }

    /// Recognize a marker anywhere in `label`. The regular marker wins when
    /// both are present.
    pub fn from_label(label: &str) -> Option<Self> {
        if label.contains(REGULAR_MARKER) {
            Some(AvailabilityKind::Regular)
        } else if label.contains(EMERGENCY_MARKER) {
            Some(AvailabilityKind::Emergency)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AvailabilityKind::Regular => "regular",
            AvailabilityKind::Emergency => "emergency",
        }
    }
}

impl fmt::Display for AvailabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvailabilityKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(AvailabilityKind::Regular),
            "emergency" => Ok(AvailabilityKind::Emergency),
            other => Err(EngineError::InvalidWindow(format!(
                "unknown availability kind '{other}' (expected regular or emergency)"
            ))),
        }
    }
}

/// How to treat an event whose start or end cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampPolicy {
    /// Exclude the event from the day and log a warning.
    #[default]
    Skip,
    /// Treat the unparseable instant as minute 0 of the day. Lossy: a block
    /// can silently stretch back to midnight.
    Midnight,
}

/// An open window during which clients may book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityBlock {
    pub id: String,
    pub label: String,
    pub interval: Interval,
    pub kind: AvailabilityKind,
}

/// Calendar occupancy that is not an availability window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusyBlock {
    pub id: String,
    pub label: String,
    pub interval: Interval,
}

/// One business day, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule {
    pub date: NaiveDate,
    /// Local midnight to the next local midnight.
    pub day: Interval,
    /// In calendar order.
    pub availability: Vec<AvailabilityBlock>,
    /// Sorted by start.
    pub busy: Vec<BusyBlock>,
}

/// Classify the raw events of `date`.
///
/// All-day events span the whole day. Every other interval is clipped to the
/// day; events left empty after clipping are dropped. Transparent events
/// without a marker are ignored.
pub fn classify_events(
    date: NaiveDate,
    events: &[CalendarEvent],
    tz: &Tz,
    policy: TimestampPolicy,
) -> DaySchedule {
    let day = Interval::day(date, tz);
    let (availability, busy) = classify_within(&day, events, tz, policy);

    tracing::debug!(
        %date,
        events = events.len(),
        availability = availability.len(),
        busy = busy.len(),
        "classified calendar events"
    );

    DaySchedule {
        date,
        day,
        availability,
        busy,
    }
}

/// Classify `events` against an arbitrary `window` instead of one day.
///
/// Same rules as [`classify_events`], with `window` taking the place of the
/// day: intervals are clipped to it and the `midnight` policy falls back to
/// its start. Busy blocks come back sorted by start.
pub fn classify_within(
    window: &Interval,
    events: &[CalendarEvent],
    tz: &Tz,
    policy: TimestampPolicy,
) -> (Vec<AvailabilityBlock>, Vec<BusyBlock>) {
    let mut availability = Vec::new();
    let mut busy = Vec::new();

    for event in events {
        let kind = AvailabilityKind::from_label(event.label());
        if kind.is_none() && event.is_transparent() {
            continue;
        }

        let Some(interval) = event_interval(event, window, tz, policy) else {
            continue;
        };

        match kind {
            Some(kind) => availability.push(AvailabilityBlock {
                id: event.id.clone(),
                label: event.label().to_string(),
                interval,
                kind,
            }),
            None => busy.push(BusyBlock {
                id: event.id.clone(),
                label: event.label().to_string(),
                interval,
            }),
        }
    }

    busy.sort_by_key(|b| (b.interval.start(), b.interval.end()));
    (availability, busy)
}

fn event_interval(
    event: &CalendarEvent,
    window: &Interval,
    tz: &Tz,
    policy: TimestampPolicy,
) -> Option<Interval> {
    if event.is_all_day() {
        // A missing or broken end still covers the start date.
        let span = event.span(tz).or_else(|| match event.start.resolve(tz) {
            ResolvedTime::AllDay(date) => Some(Interval::day(date, tz)),
            _ => None,
        });
        return span.and_then(|span| span.clip(window));
    }

    let start = resolve_bound(event, &event.start, "start", window, tz, policy)?;
    let end = resolve_bound(event, &event.end, "end", window, tz, policy)?;

    let Some(interval) = Interval::new(start, end) else {
        tracing::debug!(event_id = %event.id, "dropping empty or inverted event");
        return None;
    };
    interval.clip(window)
}

fn resolve_bound(
    event: &CalendarEvent,
    value: &EventTime,
    which: &str,
    window: &Interval,
    tz: &Tz,
    policy: TimestampPolicy,
) -> Option<DateTime<Utc>> {
    match value.resolve(tz) {
        ResolvedTime::Instant(instant) => Some(instant),
        ResolvedTime::AllDay(date) => Some(time::local_midnight(tz, date)),
        ResolvedTime::Malformed => match policy {
            TimestampPolicy::Skip => {
                tracing::warn!(
                    event_id = %event.id,
                    which,
                    raw = ?value,
                    "skipping event with malformed timestamp"
                );
                None
            }
            TimestampPolicy::Midnight => {
                tracing::warn!(
                    event_id = %event.id,
                    which,
                    raw = ?value,
                    "malformed timestamp treated as start of day"
                );
                Some(window.start())
            }
        },
    }
}
