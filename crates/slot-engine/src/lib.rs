//! # slot-engine
//!
//! Buffer-aware appointment slot computation for a calendar-backed booking
//! backend.
//!
//! Availability windows live in the calendar as events labelled
//! `REGULAR_TIMING` or `EMERGENCY_TIMING`; everything else that is not marked
//! free counts as busy. From one day of such events the engine derives the
//! bookable start times and reconciles new windows proposed by an operator.
//!
//! ## Modules
//!
//! - [`classifier`] — raw events → availability blocks + busy blocks
//! - [`slots`] — fixed-step slot grid with a buffer around busy time
//! - [`reconcile`] — overlap checks and free residual segments for new windows
//! - [`interval`] — half-open intervals on the absolute timeline
//! - [`engine`] — async façade over a calendar provider and booking store
//! - [`provider`] / [`memory`] — collaborator traits and in-memory versions
//! - [`config`] — TOML-loadable engine settings
//! - [`error`] — Error types

pub mod booking;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod interval;
pub mod memory;
pub mod provider;
pub mod reconcile;
pub mod slots;
pub mod time;

pub use booking::{service_duration_minutes, BookingRecord, BookingStatus};
pub use classifier::{classify_events, AvailabilityBlock, AvailabilityKind, BusyBlock, DaySchedule, TimestampPolicy};
pub use config::EngineConfig;
pub use engine::{AvailabilityWindow, BookingRequest, SlotEngine, WindowOutcome};
pub use error::EngineError;
pub use event::{CalendarEvent, EventTime, NewEvent, Transparency};
pub use interval::{subtract_intervals, Interval};
pub use memory::{MemoryBookings, MemoryCalendar};
pub use provider::{BookingStore, CalendarProvider};
pub use reconcile::{check_delete, check_update, reconcile_window, ConflictReport, DeleteVerdict, ProposedSegment, ProposedWindow, Reconciliation};
pub use slots::{generate_slots, Slot, SlotGrid, SlotKind, SlotRequest};
