//! Error types for slot-engine operations.
//!
//! Reconciliation conflicts and deletion vetoes are ordinary results, not
//! errors. Only invalid input, configuration problems and collaborator
//! failures end up here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid availability window: {0}")]
    InvalidWindow(String),

    #[error("Invalid slot duration: {0} minutes")]
    InvalidDuration(u32),

    #[error("Availability window not found: {0}")]
    WindowNotFound(String),

    #[error("Slot {date} {time} is no longer available")]
    SlotUnavailable { date: String, time: String },

    #[error("Calendar provider error: {0}")]
    Calendar(String),

    #[error("Booking store error: {0}")]
    BookingStore(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
