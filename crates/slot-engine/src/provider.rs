//! Collaborator interfaces.
//!
//! The engine never reaches for a global client: a [`CalendarProvider`] and a
//! [`BookingStore`] are handed to [`crate::SlotEngine::new`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::booking::{BookingRecord, BookingStatus};
use crate::error::Result;
use crate::event::{CalendarEvent, NewEvent};

/// Source of truth for availability windows and busy time.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Events intersecting `[range_start, range_end)`.
    async fn list_events(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>>;

    async fn get_event(&self, id: &str) -> Result<Option<CalendarEvent>>;

    async fn create_event(&self, event: NewEvent) -> Result<CalendarEvent>;

    async fn update_event(&self, id: &str, event: NewEvent) -> Result<CalendarEvent>;

    async fn delete_event(&self, id: &str) -> Result<()>;
}

/// Persistent booking records.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn bookings_on(&self, date: NaiveDate, status: BookingStatus) -> Result<Vec<BookingRecord>>;
}

#[async_trait]
impl<T: CalendarProvider + ?Sized> CalendarProvider for Arc<T> {
    async fn list_events(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        (**self).list_events(range_start, range_end).await
    }

    async fn get_event(&self, id: &str) -> Result<Option<CalendarEvent>> {
        (**self).get_event(id).await
    }

    async fn create_event(&self, event: NewEvent) -> Result<CalendarEvent> {
        (**self).create_event(event).await
    }

    async fn update_event(&self, id: &str, event: NewEvent) -> Result<CalendarEvent> {
        (**self).update_event(id, event).await
    }

    async fn delete_event(&self, id: &str) -> Result<()> {
        (**self).delete_event(id).await
    }
}

#[async_trait]
impl<T: BookingStore + ?Sized> BookingStore for Arc<T> {
    async fn bookings_on(&self, date: NaiveDate, status: BookingStatus) -> Result<Vec<BookingRecord>> {
        (**self).bookings_on(date, status).await
    }
}
