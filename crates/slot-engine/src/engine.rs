//! The slot engine façade: fetch, classify, compute, and apply.
//!
//! Every call fetches the day from the calendar provider and recomputes from
//! scratch. Nothing is cached between calls, so identical calendar state
//! always yields identical output.

use chrono::{Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::Serialize;

use crate::booking::{service_duration_minutes, BookingStatus};
use crate::classifier::{
    classify_events, classify_within, AvailabilityBlock, AvailabilityKind, DaySchedule,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::event::{CalendarEvent, NewEvent};
use crate::interval::Interval;
use crate::provider::{BookingStore, CalendarProvider};
use crate::reconcile::{
    check_delete, check_update, reconcile_window, ConflictReport, DeleteVerdict, ProposedWindow,
    Reconciliation,
};
use crate::slots::{free_slots, generate_slots, is_offered, Slot, SlotRequest};
use crate::time;

/// Result of declaring or updating an availability window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WindowOutcome {
    /// The calendar now holds the window under `event_id`.
    Accepted { event_id: String },
    /// Nothing was written.
    Conflict(ConflictReport),
}

/// An availability window as shown to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityWindow {
    pub id: String,
    pub date: NaiveDate,
    #[serde(with = "time::hhmm")]
    pub start_time: NaiveTime,
    /// `24:00` when the window runs to the end of the day.
    #[serde(with = "time::hhmm_end")]
    pub end_time: NaiveTime,
    pub kind: AvailabilityKind,
}

/// A client's request to take a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub full_name: String,
    pub service_type: String,
    pub emergency: bool,
}

impl BookingRequest {
    /// Calendar label of the booking event.
    pub fn label(&self) -> String {
        let label = format!("BOOKED: {} ({})", self.full_name, self.service_type);
        if self.emergency {
            format!("[EMERGENCY] {label}")
        } else {
            label
        }
    }

    fn kind(&self) -> AvailabilityKind {
        if self.emergency {
            AvailabilityKind::Emergency
        } else {
            AvailabilityKind::Regular
        }
    }
}

pub struct SlotEngine<C, B> {
    calendar: C,
    bookings: B,
    config: EngineConfig,
    tz: Tz,
}

impl<C: CalendarProvider, B: BookingStore> SlotEngine<C, B> {
    /// # Errors
    /// Returns `EngineError::Config` or `EngineError::InvalidTimezone` when
    /// `config` does not validate.
    pub fn new(calendar: C, bookings: B, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let tz = config.tz()?;
        Ok(Self {
            calendar,
            bookings,
            config,
            tz,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn calendar(&self) -> &C {
        &self.calendar
    }

    pub fn bookings(&self) -> &B {
        &self.bookings
    }

    /// Fetch and classify the events of `date`.
    pub async fn day_schedule(&self, date: NaiveDate) -> Result<DaySchedule> {
        let day = Interval::day(date, &self.tz);
        let events = self.calendar.list_events(day.start(), day.end()).await?;
        Ok(classify_events(
            date,
            &events,
            &self.tz,
            self.config.timestamp_policy,
        ))
    }

    /// Slots of `date` for sessions of `duration_minutes` (the configured
    /// default when `None`).
    ///
    /// With `include_busy` the result is the full-day timeline, including
    /// busy blocks and canceled bookings from the booking store.
    pub async fn compute_slots(
        &self,
        date: NaiveDate,
        duration_minutes: Option<u32>,
        kind: Option<AvailabilityKind>,
        include_busy: bool,
    ) -> Result<Vec<Slot>> {
        let request = SlotRequest {
            duration_minutes: duration_minutes.unwrap_or(self.config.default_duration_minutes),
            kind,
            include_busy,
        };
        let schedule = self.day_schedule(date).await?;
        let canceled = if include_busy {
            self.bookings.bookings_on(date, BookingStatus::Canceled).await?
        } else {
            Vec::new()
        };

        let slots = generate_slots(&schedule, &request, self.config.grid(), &canceled, &self.tz)?;
        tracing::debug!(
            %date,
            duration = request.duration_minutes,
            kind = ?kind,
            include_busy,
            slots = slots.len(),
            "computed slots"
        );
        Ok(slots)
    }

    /// Availability windows declared for `date`, in local time.
    pub async fn list_windows(&self, date: NaiveDate) -> Result<Vec<AvailabilityWindow>> {
        let schedule = self.day_schedule(date).await?;
        let mut windows: Vec<AvailabilityWindow> = schedule
            .availability
            .iter()
            .map(|block| self.window_view(date, block))
            .collect();
        windows.sort_by_key(|w| (w.start_time, w.end_time));
        Ok(windows)
    }

    /// Open a new availability window unless it overlaps an existing one.
    pub async fn declare_window(&self, proposed: &ProposedWindow) -> Result<WindowOutcome> {
        let schedule = self.day_schedule(proposed.date).await?;
        match reconcile_window(proposed, &schedule.availability, &self.tz) {
            Reconciliation::Accepted => {
                let created = self.calendar.create_event(proposed.to_event()).await?;
                tracing::info!(
                    event_id = %created.id,
                    date = %proposed.date,
                    kind = %proposed.kind,
                    "created availability window"
                );
                Ok(WindowOutcome::Accepted {
                    event_id: created.id,
                })
            }
            Reconciliation::Conflict(report) => {
                tracing::debug!(
                    date = %proposed.date,
                    overlaps = report.overlaps.len(),
                    "availability window overlaps existing windows"
                );
                Ok(WindowOutcome::Conflict(report))
            }
        }
    }

    /// Move or resize window `window_id`, checked against all other windows.
    ///
    /// # Errors
    /// Returns `EngineError::WindowNotFound` when `window_id` is missing or
    /// names an event that is not an availability window.
    pub async fn update_window(
        &self,
        window_id: &str,
        proposed: &ProposedWindow,
    ) -> Result<WindowOutcome> {
        self.window_event(window_id).await?;

        let schedule = self.day_schedule(proposed.date).await?;
        match check_update(window_id, proposed, &schedule.availability, &self.tz) {
            Reconciliation::Accepted => {
                let updated = self
                    .calendar
                    .update_event(window_id, proposed.to_event())
                    .await?;
                tracing::info!(event_id = %updated.id, date = %proposed.date, "updated availability window");
                Ok(WindowOutcome::Accepted {
                    event_id: updated.id,
                })
            }
            Reconciliation::Conflict(report) => Ok(WindowOutcome::Conflict(report)),
        }
    }

    /// Delete window `window_id` unless a booking sits inside it.
    ///
    /// Bookings are looked up over the window's whole span, so a window
    /// running past midnight is checked on both days.
    pub async fn delete_window(&self, window_id: &str) -> Result<DeleteVerdict> {
        let event = self.window_event(window_id).await?;
        let span = event.span(&self.tz).ok_or_else(|| {
            EngineError::InvalidWindow(format!("event {window_id} has no usable span"))
        })?;

        let events = self.calendar.list_events(span.start(), span.end()).await?;
        let (availability, busy) =
            classify_within(&span, &events, &self.tz, self.config.timestamp_policy);
        let window = availability
            .iter()
            .find(|block| block.id == window_id)
            .ok_or_else(|| EngineError::WindowNotFound(window_id.to_string()))?;

        let verdict = check_delete(window, &busy);
        match &verdict {
            DeleteVerdict::Allowed => {
                self.calendar.delete_event(window_id).await?;
                tracing::info!(event_id = %window_id, start = %span.start(), "deleted availability window");
            }
            DeleteVerdict::Blocked { booking_id, .. } => {
                tracing::info!(
                    event_id = %window_id,
                    %booking_id,
                    "refusing to delete availability window with an active booking"
                );
            }
        }
        Ok(verdict)
    }

    /// Whether a free slot starting at `start_time` is still offered.
    pub async fn verify_slot(
        &self,
        date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: u32,
        kind: Option<AvailabilityKind>,
    ) -> Result<bool> {
        let schedule = self.day_schedule(date).await?;
        let slots = free_slots(&schedule, duration_minutes, kind, self.config.grid(), &self.tz)?;
        Ok(is_offered(&slots, start_time, duration_minutes, kind))
    }

    /// Re-check the requested slot, then write the booking into the calendar.
    ///
    /// The check narrows the window for double bookings but does not close
    /// it: two clients passing the check at the same time both get written.
    ///
    /// # Errors
    /// Returns `EngineError::SlotUnavailable` when the slot is no longer
    /// offered.
    pub async fn book_slot(&self, request: &BookingRequest) -> Result<CalendarEvent> {
        let duration = service_duration_minutes(&request.service_type);
        let offered = self
            .verify_slot(request.date, request.start_time, duration, Some(request.kind()))
            .await?;
        if !offered {
            return Err(EngineError::SlotUnavailable {
                date: request.date.to_string(),
                time: time::format_hhmm(request.start_time),
            });
        }

        let start = time::local_to_utc(&self.tz, request.date.and_time(request.start_time));
        let event = NewEvent {
            summary: request.label(),
            start,
            end: start + Duration::minutes(i64::from(duration)),
            description: None,
        };
        let created = self.calendar.create_event(event).await?;
        tracing::info!(
            event_id = %created.id,
            date = %request.date,
            time = %time::format_hhmm(request.start_time),
            "booked slot"
        );
        Ok(created)
    }

    fn window_view(&self, date: NaiveDate, block: &AvailabilityBlock) -> AvailabilityWindow {
        AvailabilityWindow {
            id: block.id.clone(),
            date,
            start_time: time::local_time(&self.tz, block.interval.start()),
            end_time: time::local_time(&self.tz, block.interval.end()),
            kind: block.kind,
        }
    }

    /// The calendar event behind window `window_id`.
    async fn window_event(&self, window_id: &str) -> Result<CalendarEvent> {
        self.calendar
            .get_event(window_id)
            .await?
            .filter(|event| AvailabilityKind::from_label(event.label()).is_some())
            .ok_or_else(|| EngineError::WindowNotFound(window_id.to_string()))
    }
}
