//! Candidate slot enumeration for booking views.

use chrono::{Datelike, NaiveDate, NaiveTime};
use rusqlite::Connection;
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::db::repository::{blocking_intervals, get_employee};
use crate::models::TimeSlot;

use super::conflict::{intervals_overlap, minutes_since_midnight};
use super::SchedulingError;

/// All candidate start times for the employee on `date`, stepping at the
/// configured granularity from opening time. A candidate that would run
/// past closing is not produced at all; the rest are flagged available
/// unless they overlap a blocking appointment. Closed day means no
/// candidates. Always computed fresh from the current bookings.
pub fn compute_slots(
    conn: &Connection,
    config: &SchedulingConfig,
    employee_id: &Uuid,
    date: NaiveDate,
    service_duration_minutes: i64,
) -> Result<Vec<TimeSlot>, SchedulingError> {
    if service_duration_minutes <= 0 {
        return Err(SchedulingError::Validation {
            field: "duration_minutes".into(),
            reason: format!("must be positive, got {service_duration_minutes}"),
        });
    }
    if config.slot_granularity_minutes <= 0 {
        return Err(SchedulingError::Validation {
            field: "slot_granularity_minutes".into(),
            reason: format!("must be positive, got {}", config.slot_granularity_minutes),
        });
    }
    if config.booking_buffer_minutes < 0 {
        return Err(SchedulingError::Validation {
            field: "booking_buffer_minutes".into(),
            reason: format!("must not be negative, got {}", config.booking_buffer_minutes),
        });
    }

    let employee = get_employee(conn, employee_id)?.ok_or_else(|| SchedulingError::NotFound {
        entity_type: "employee".to_string(),
        id: employee_id.to_string(),
    })?;

    let Some(window) = employee.hours.for_weekday(date.weekday()) else {
        return Ok(Vec::new());
    };

    let open = minutes_since_midnight(window.opens_at);
    let close = minutes_since_midnight(window.closes_at);

    let booked: Vec<(i64, i64)> = blocking_intervals(conn, employee_id, date)?
        .iter()
        .map(|b| {
            let start = minutes_since_midnight(b.start_time);
            (start, start + b.duration_minutes + config.booking_buffer_minutes)
        })
        .collect();

    let mut slots = Vec::new();
    let mut start = open;
    while start + service_duration_minutes <= close {
        let end = start + service_duration_minutes + config.booking_buffer_minutes;
        let available = !booked
            .iter()
            .any(|&(booked_start, booked_end)| intervals_overlap(start, end, booked_start, booked_end));
        slots.push(TimeSlot {
            start_time: time_from_minutes(start),
            duration_minutes: service_duration_minutes,
            available,
        });
        start += config.slot_granularity_minutes;
    }
    Ok(slots)
}

fn time_from_minutes(minutes: i64) -> NaiveTime {
    NaiveTime::from_num_seconds_from_midnight_opt((minutes * 60) as u32, 0).unwrap_or_default()
}
