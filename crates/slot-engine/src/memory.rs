//! In-memory collaborators, backed by plain vectors.
//!
//! Used by the CLI to work on calendar dumps and by the tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::booking::{BookingRecord, BookingStatus};
use crate::error::{EngineError, Result};
use crate::event::{CalendarEvent, EventTime, NewEvent, Transparency};
use crate::interval::Interval;
use crate::provider::{BookingStore, CalendarProvider};

#[derive(Debug)]
pub struct MemoryCalendar {
    tz: Tz,
    events: Mutex<Vec<CalendarEvent>>,
    next_id: AtomicU64,
}

impl MemoryCalendar {
    pub fn new(tz: Tz) -> Self {
        Self::with_events(tz, Vec::new())
    }

    pub fn with_events(tz: Tz, events: Vec<CalendarEvent>) -> Self {
        Self {
            tz,
            next_id: AtomicU64::new(events.len() as u64 + 1),
            events: Mutex::new(events),
        }
    }

    /// Snapshot of every stored event.
    pub fn events(&self) -> Result<Vec<CalendarEvent>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<CalendarEvent>>> {
        self.events
            .lock()
            .map_err(|_| EngineError::Calendar("calendar state poisoned".to_string()))
    }

    fn allocate_id(&self) -> String {
        format!("evt-{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

fn to_calendar_event(id: String, event: NewEvent) -> CalendarEvent {
    CalendarEvent {
        id,
        summary: Some(event.summary),
        description: event.description,
        start: EventTime::timed(event.start),
        end: EventTime::timed(event.end),
        transparency: Transparency::Opaque,
    }
}

#[async_trait]
impl CalendarProvider for MemoryCalendar {
    /// Events whose span intersects the range. Events whose timestamps do not
    /// parse are always returned, leaving their fate to the classifier.
    async fn list_events(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        let Some(range) = Interval::new(range_start, range_end) else {
            return Ok(Vec::new());
        };
        let events = self.lock()?;
        Ok(events
            .iter()
            .filter(|event| event.span(&self.tz).is_none_or(|span| span.overlaps(&range)))
            .cloned()
            .collect())
    }

    async fn get_event(&self, id: &str) -> Result<Option<CalendarEvent>> {
        Ok(self.lock()?.iter().find(|event| event.id == id).cloned())
    }

    async fn create_event(&self, event: NewEvent) -> Result<CalendarEvent> {
        let created = to_calendar_event(self.allocate_id(), event);
        self.lock()?.push(created.clone());
        Ok(created)
    }

    async fn update_event(&self, id: &str, event: NewEvent) -> Result<CalendarEvent> {
        let mut events = self.lock()?;
        let slot = events
            .iter_mut()
            .find(|existing| existing.id == id)
            .ok_or_else(|| EngineError::Calendar(format!("event not found: {id}")))?;
        let transparency = slot.transparency;
        *slot = CalendarEvent {
            transparency,
            ..to_calendar_event(id.to_string(), event)
        };
        Ok(slot.clone())
    }

    async fn delete_event(&self, id: &str) -> Result<()> {
        let mut events = self.lock()?;
        let before = events.len();
        events.retain(|event| event.id != id);
        if events.len() == before {
            return Err(EngineError::Calendar(format!("event not found: {id}")));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryBookings {
    bookings: Mutex<Vec<BookingRecord>>,
}

impl MemoryBookings {
    pub fn new(bookings: Vec<BookingRecord>) -> Self {
        Self {
            bookings: Mutex::new(bookings),
        }
    }

    pub fn insert(&self, booking: BookingRecord) -> Result<()> {
        self.lock()?.push(booking);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<BookingRecord>>> {
        self.bookings
            .lock()
            .map_err(|_| EngineError::BookingStore("booking state poisoned".to_string()))
    }
}

#[async_trait]
impl BookingStore for MemoryBookings {
    async fn bookings_on(&self, date: NaiveDate, status: BookingStatus) -> Result<Vec<BookingRecord>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|b| b.preferred_date == date && b.status == status)
            .cloned()
            .collect())
    }
}
