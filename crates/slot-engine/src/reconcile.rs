//! Reconcile operator-proposed availability windows with existing ones.
//!
//! Regular and emergency windows both occupy the timeline: a new window may
//! not overlap any existing window of either kind. When it does, nothing is
//! created and the caller gets back the pieces of the proposal that are still
//! unclaimed, ready to be resubmitted one by one.

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::Serialize;

use crate::classifier::{AvailabilityBlock, AvailabilityKind, BusyBlock};
use crate::error::{EngineError, Result};
use crate::event::NewEvent;
use crate::interval::{subtract_intervals, Interval};
use crate::time;

const WINDOW_DESCRIPTION: &str = "Availability block";

/// A window the operator wants to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedWindow {
    pub date: NaiveDate,
    pub interval: Interval,
    pub kind: AvailabilityKind,
}

impl ProposedWindow {
    /// Build a window from local wall-clock bounds on `date`.
    ///
    /// An `end` of midnight (`00:00`, or `24:00` as parsed by
    /// [`time::parse_hhmm`]) means the end of the day.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidWindow` when `end` is not after `start`.
    pub fn from_local(
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        kind: AvailabilityKind,
        tz: &Tz,
    ) -> Result<Self> {
        let end_instant = if end == NaiveTime::MIN {
            Interval::day(date, tz).end()
        } else {
            time::local_to_utc(tz, date.and_time(end))
        };
        let start_instant = time::local_to_utc(tz, date.and_time(start));
        let interval = Interval::new(start_instant, end_instant).ok_or_else(|| {
            EngineError::InvalidWindow(format!(
                "{} {}-{}: end must be after start",
                date,
                time::format_hhmm(start),
                time::format_end_hhmm(end)
            ))
        })?;
        Ok(Self {
            date,
            interval,
            kind,
        })
    }

    /// The calendar event that stores this window.
    pub fn to_event(&self) -> NewEvent {
        NewEvent {
            summary: self.kind.marker().to_string(),
            start: self.interval.start(),
            end: self.interval.end(),
            description: Some(WINDOW_DESCRIPTION.to_string()),
        }
    }
}

/// An unclaimed remainder of a proposed window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposedSegment {
    #[serde(with = "time::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "time::hhmm_end")]
    pub end_time: NaiveTime,
    #[serde(skip)]
    pub interval: Interval,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    /// `"<label>: HH:MM - HH:MM"` per overlapping window, by start.
    pub overlaps: Vec<String>,
    pub proposed_segments: Vec<ProposedSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Reconciliation {
    Accepted,
    Conflict(ConflictReport),
}

impl Reconciliation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Reconciliation::Accepted)
    }
}

/// Whether an availability window may be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeleteVerdict {
    Allowed,
    /// A booking sits inside the window.
    Blocked { booking_id: String, label: String },
}

/// Existing windows that strictly overlap `proposed`, sorted by start.
pub fn overlapping_blocks<'a>(
    proposed: &Interval,
    existing: &'a [AvailabilityBlock],
) -> Vec<&'a AvailabilityBlock> {
    let mut hits: Vec<&AvailabilityBlock> = existing
        .iter()
        .filter(|block| block.interval.overlaps(proposed))
        .collect();
    hits.sort_by_key(|block| (block.interval.start(), block.interval.end()));
    hits
}

/// Check a proposed window against the day's existing windows.
pub fn reconcile_window(
    proposed: &ProposedWindow,
    existing: &[AvailabilityBlock],
    tz: &Tz,
) -> Reconciliation {
    let hits = overlapping_blocks(&proposed.interval, existing);
    if hits.is_empty() {
        return Reconciliation::Accepted;
    }

    let overlaps = hits
        .iter()
        .map(|block| {
            format!(
                "{}: {} - {}",
                block.label,
                time::format_hhmm(time::local_time(tz, block.interval.start())),
                time::format_end_hhmm(time::local_time(tz, block.interval.end()))
            )
        })
        .collect();

    let claimed: Vec<Interval> = hits.iter().map(|block| block.interval).collect();
    let proposed_segments = subtract_intervals(&proposed.interval, &claimed)
        .into_iter()
        .map(|interval| ProposedSegment {
            start_time: time::local_time(tz, interval.start()),
            end_time: time::local_time(tz, interval.end()),
            interval,
        })
        .collect();

    Reconciliation::Conflict(ConflictReport {
        overlaps,
        proposed_segments,
    })
}

/// Check a change to window `window_id` against every other window.
pub fn check_update(
    window_id: &str,
    proposed: &ProposedWindow,
    existing: &[AvailabilityBlock],
    tz: &Tz,
) -> Reconciliation {
    let others: Vec<AvailabilityBlock> = existing
        .iter()
        .filter(|block| block.id != window_id)
        .cloned()
        .collect();
    reconcile_window(proposed, &others, tz)
}

/// Refuse to delete `window` while a busy block overlaps it.
pub fn check_delete(window: &AvailabilityBlock, busy: &[BusyBlock]) -> DeleteVerdict {
    busy.iter()
        .filter(|b| b.id != window.id)
        .find(|b| b.interval.overlaps(&window.interval))
        .map_or(DeleteVerdict::Allowed, |b| DeleteVerdict::Blocked {
            booking_id: b.id.clone(),
            label: b.label.clone(),
        })
}
