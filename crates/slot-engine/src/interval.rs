//! Half-open time intervals on the absolute timeline.
//!
//! Every overlap comparison in the engine goes through [`Interval`], so values
//! coming from different offsets (`Z`, `+05:30`, naive local) are compared as
//! instants rather than as wall-clock strings.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::time;

/// A non-empty half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Interval {
    /// Build an interval, or `None` when it would be empty or inverted.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// The business day `date` in `tz`: local midnight to the next local midnight.
    pub fn day(date: NaiveDate, tz: &Tz) -> Self {
        let start = time::local_midnight(tz, date);
        let end = date
            .succ_opt()
            .map(|next| time::local_midnight(tz, next))
            .filter(|end| *end > start)
            .unwrap_or(start + Duration::days(1));
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Strict overlap: `a.start < b.end && b.start < a.end`.
    ///
    /// Intervals that merely touch (one ends exactly when the other starts)
    /// do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Widen the interval by `minutes` on both ends.
    pub fn inflate(&self, minutes: u32) -> Self {
        let pad = Duration::minutes(i64::from(minutes));
        Self {
            start: self.start - pad,
            end: self.end + pad,
        }
    }

    /// Intersection with `window`, or `None` when they do not overlap.
    pub fn clip(&self, window: &Interval) -> Option<Self> {
        Self::new(self.start.max(window.start), self.end.min(window.end))
    }

    /// Whether `other` lies entirely within this interval.
    pub fn covers(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Subtract `removals` from `base`, returning the maximal uncovered pieces.
///
/// Removals may overlap each other and may extend past `base`. The result is
/// sorted by start and contains no zero-length pieces.
pub fn subtract_intervals(base: &Interval, removals: &[Interval]) -> Vec<Interval> {
    let mut sorted: Vec<Interval> = removals.to_vec();
    sorted.sort_by_key(|r| (r.start, r.end));

    let mut pieces = Vec::new();
    let mut cursor = base.start;

    for removal in &sorted {
        if removal.end <= cursor {
            continue;
        }
        if removal.start >= base.end {
            break;
        }
        if removal.start > cursor {
            pieces.extend(Interval::new(cursor, removal.start));
        }
        cursor = cursor.max(removal.end);
        if cursor >= base.end {
            break;
        }
    }

    // Trailing piece after the last removal.
    pieces.extend(Interval::new(cursor, base.end));

    pieces
}
