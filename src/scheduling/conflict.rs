//! Overlap detection for proposed bookings.
//!
//! All interval math runs on minutes since midnight, so a duration can
//! never wrap a time-of-day around the clock.

use chrono::{NaiveDate, NaiveTime, Timelike};
use rusqlite::Connection;
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::db::repository::blocking_intervals;

use super::SchedulingError;

pub(crate) fn minutes_since_midnight(t: NaiveTime) -> i64 {
    (t.hour() * 60 + t.minute()) as i64
}

/// Half-open interval test: `[start_a, end_a)` and `[start_b, end_b)`
/// overlap iff each starts before the other ends. Touching endpoints do
/// not overlap, so back-to-back bookings are allowed.
pub fn intervals_overlap(start_a: i64, end_a: i64, start_b: i64, end_b: i64) -> bool {
    start_a < end_b && start_b < end_a
}

/// True when the proposed interval overlaps a blocking appointment for the
/// employee on that date. An unassigned proposal never conflicts, and
/// `exclude_appointment_id` lets an appointment's own edit skip itself.
///
/// The configured buffer pads the end of both the proposed and the booked
/// interval, modelling cleanup time between bookings. Zero keeps exact
/// back-to-back allowed; a negative buffer would shrink the intervals and
/// let overlapping bookings through, so it is rejected outright.
pub fn has_conflict(
    conn: &Connection,
    config: &SchedulingConfig,
    employee_id: Option<&Uuid>,
    date: NaiveDate,
    start_time: NaiveTime,
    duration_minutes: i64,
    exclude_appointment_id: Option<&Uuid>,
) -> Result<bool, SchedulingError> {
    if config.booking_buffer_minutes < 0 {
        return Err(SchedulingError::Validation {
            field: "booking_buffer_minutes".into(),
            reason: format!("must not be negative, got {}", config.booking_buffer_minutes),
        });
    }
    let Some(employee_id) = employee_id else {
        return Ok(false);
    };

    let start = minutes_since_midnight(start_time);
    let end = start + duration_minutes + config.booking_buffer_minutes;

    for booked in blocking_intervals(conn, employee_id, date)? {
        if exclude_appointment_id == Some(&booked.appointment_id) {
            continue;
        }
        let booked_start = minutes_since_midnight(booked.start_time);
        let booked_end = booked_start + booked.duration_minutes + config.booking_buffer_minutes;
        if intervals_overlap(start, end, booked_start, booked_end) {
            return Ok(true);
        }
    }
    Ok(false)
}
