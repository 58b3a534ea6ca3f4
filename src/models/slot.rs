use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// A candidate start time for one employee/date. Computed on demand from
/// working hours and existing bookings, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
    pub available: bool,
}
