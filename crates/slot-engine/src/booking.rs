//! Booking records as kept by the booking store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Confirmed,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking_id: String,
    pub full_name: String,
    /// Product code such as `live-20` or `live-40`.
    pub service_type: String,
    pub preferred_date: NaiveDate,
    /// Local `HH:MM`, absent for bookings that are not live sessions.
    #[serde(default)]
    pub preferred_time: Option<String>,
    #[serde(default)]
    pub status: BookingStatus,
}

/// Session length implied by a service type: codes containing "40" run for
/// 40 minutes, everything else for 20.
pub fn service_duration_minutes(service_type: &str) -> u32 {
    if service_type.contains("40") {
        40
    } else {
        20
    }
}
