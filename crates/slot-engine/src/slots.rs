//! Candidate slot generation.
//!
//! Each availability block is walked on a fixed grid anchored at the block's
//! start. The grid step is independent of the requested duration so that
//! services of different lengths share the same start times. A candidate is
//! rejected when it strictly overlaps any busy block widened by the buffer on
//! both sides; touching the widened boundary is fine.

use chrono::{Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::booking::{service_duration_minutes, BookingRecord, BookingStatus};
use crate::classifier::{AvailabilityKind, DaySchedule};
use crate::error::{EngineError, Result};
use crate::interval::Interval;
use crate::time;

/// Grid parameters shared by every slot computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGrid {
    pub step_minutes: u32,
    pub buffer_minutes: u32,
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self {
            step_minutes: 20,
            buffer_minutes: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Regular,
    Emergency,
    /// Occupied calendar time, shown on the full-day timeline.
    Busy,
    /// A canceled booking, shown for history only.
    Canceled,
}

impl From<AvailabilityKind> for SlotKind {
    fn from(kind: AvailabilityKind) -> Self {
        match kind {
            AvailabilityKind::Regular => SlotKind::Regular,
            AvailabilityKind::Emergency => SlotKind::Emergency,
        }
    }
}

/// A bookable (or, in the full-day view, occupied) unit of time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub date: NaiveDate,
    #[serde(with = "time::hhmm")]
    pub start_time: NaiveTime,
    pub kind: SlotKind,
    pub duration_minutes: u32,
    pub is_booked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupant: Option<String>,
}

/// What the caller wants from [`generate_slots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRequest {
    pub duration_minutes: u32,
    /// Restrict to blocks of this kind.
    pub kind: Option<AvailabilityKind>,
    /// Also emit busy blocks and canceled bookings (full-day view).
    pub include_busy: bool,
}

/// Free slots of `schedule`, in block order then grid order.
pub fn free_slots(
    schedule: &DaySchedule,
    duration_minutes: u32,
    kind: Option<AvailabilityKind>,
    grid: SlotGrid,
    tz: &Tz,
) -> Result<Vec<Slot>> {
    if duration_minutes == 0 {
        return Err(EngineError::InvalidDuration(duration_minutes));
    }
    if grid.step_minutes == 0 {
        return Err(EngineError::Config("step_minutes must be > 0".to_string()));
    }

    let duration = Duration::minutes(i64::from(duration_minutes));
    let step = Duration::minutes(i64::from(grid.step_minutes));

    // Widen once; every candidate is tested against the same list.
    let blocked: Vec<Interval> = schedule
        .busy
        .iter()
        .map(|busy| busy.interval.inflate(grid.buffer_minutes))
        .collect();

    let mut slots = Vec::new();

    for block in schedule
        .availability
        .iter()
        .filter(|block| kind.is_none_or(|k| k == block.kind))
    {
        let mut cursor = block.interval.start();
        while cursor + duration <= block.interval.end() {
            let conflicting = Interval::new(cursor, cursor + duration)
                .is_none_or(|candidate| blocked.iter().any(|b| candidate.overlaps(b)));

            if !conflicting {
                let start_time = time::local_time(tz, cursor);
                slots.push(Slot {
                    id: format!("gcal-{}-{}", schedule.date, time::format_hhmm(start_time)),
                    date: schedule.date,
                    start_time,
                    kind: block.kind.into(),
                    duration_minutes,
                    is_booked: false,
                    occupant: None,
                });
            }

            cursor += step;
        }
    }

    Ok(slots)
}

/// Compute the slots of one day.
///
/// With `include_busy` the result also carries one slot per busy block (at
/// its own start and actual duration) and one per canceled booking in
/// `canceled` for that date. Neither kind takes part in the conflict test.
/// The output is sorted by `(date, start_time)`; ties keep generation order.
pub fn generate_slots(
    schedule: &DaySchedule,
    request: &SlotRequest,
    grid: SlotGrid,
    canceled: &[BookingRecord],
    tz: &Tz,
) -> Result<Vec<Slot>> {
    let mut slots = free_slots(schedule, request.duration_minutes, request.kind, grid, tz)?;

    if request.include_busy {
        slots.extend(busy_slots(schedule, tz));
        slots.extend(canceled_slots(schedule.date, canceled));
    }

    slots.sort_by_key(|slot| (slot.date, slot.start_time));
    Ok(slots)
}

fn busy_slots<'a>(schedule: &'a DaySchedule, tz: &'a Tz) -> impl Iterator<Item = Slot> + 'a {
    schedule.busy.iter().filter_map(move |busy| {
        let minutes = u32::try_from(busy.interval.duration_minutes()).ok()?;
        if minutes == 0 {
            return None;
        }
        Some(Slot {
            id: busy.id.clone(),
            date: schedule.date,
            start_time: time::local_time(tz, busy.interval.start()),
            kind: SlotKind::Busy,
            duration_minutes: minutes,
            is_booked: true,
            occupant: Some(busy.label.clone()),
        })
    })
}

fn canceled_slots(date: NaiveDate, bookings: &[BookingRecord]) -> impl Iterator<Item = Slot> + '_ {
    bookings
        .iter()
        .filter(move |b| b.status == BookingStatus::Canceled && b.preferred_date == date)
        .filter_map(move |booking| {
            let Some(start_time) = booking.preferred_time.as_deref().and_then(time::parse_hhmm)
            else {
                tracing::warn!(
                    booking_id = %booking.booking_id,
                    "canceled booking has no usable preferred_time, not shown"
                );
                return None;
            };
            Some(Slot {
                id: format!("canceled-{}", booking.booking_id),
                date,
                start_time,
                kind: SlotKind::Canceled,
                duration_minutes: service_duration_minutes(&booking.service_type),
                is_booked: true,
                occupant: Some(format!("CANCELED: {}", booking.full_name)),
            })
        })
}

/// Whether `slots` offers a free start at `start_time` of at least the given
/// duration and, when given, kind.
pub fn is_offered(
    slots: &[Slot],
    start_time: NaiveTime,
    duration_minutes: u32,
    kind: Option<AvailabilityKind>,
) -> bool {
    slots.iter().any(|slot| {
        !slot.is_booked
            && slot.start_time == start_time
            && slot.duration_minutes >= duration_minutes
            && kind.is_none_or(|k| slot.kind == SlotKind::from(k))
    })
}
