//! Booking operations — the single mutation entry point for appointments.
//!
//! Everything that changes an appointment goes through [`Scheduler`]:
//! create, status transitions, reschedule, arrival stamping, deletion.
//! Each successful mutation commits first and then notifies the
//! broadcaster exactly once, so every dashboard converges on the same
//! state.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::broadcast::ChangeBroadcaster;
use crate::config::SchedulingConfig;
use crate::db::repository::{
    delete_appointment, get_appointment, get_employee, get_service, insert_appointment,
    update_appointment_fields, AppointmentUpdate,
};
use crate::db::DatabaseError;
use crate::models::{Appointment, AppointmentStatus, BookingSource, Employee, TimeSlot};

use super::conflict::{has_conflict, minutes_since_midnight};
use super::lifecycle::{initial_status, validate_transition};
use super::slots::compute_slots;
use super::SchedulingError;

// ─── Types ────────────────────────────────────────────────────────────────────

/// Booking request as the surrounding platform submits it. Date and time
/// arrive as strings and are validated before anything touches storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub service_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: Option<String>,
    pub date: String,       // YYYY-MM-DD
    pub start_time: String, // HH:MM
    pub notes: Option<String>,
    pub source: BookingSource,
}

pub struct Scheduler {
    config: SchedulingConfig,
    broadcaster: Arc<dyn ChangeBroadcaster>,
}

// ─── Operations ───────────────────────────────────────────────────────────────

impl Scheduler {
    pub fn new(config: SchedulingConfig, broadcaster: Arc<dyn ChangeBroadcaster>) -> Self {
        Self {
            config,
            broadcaster,
        }
    }

    /// Books a new appointment. Validation happens before any write; the
    /// conflict check and the insert share one transaction, so of two
    /// overlapping writers only the first can commit.
    pub fn create_appointment(
        &self,
        conn: &Connection,
        request: &BookingRequest,
    ) -> Result<Appointment, SchedulingError> {
        if request.client_name.trim().is_empty() {
            return Err(SchedulingError::Validation {
                field: "client_name".into(),
                reason: "must not be empty".into(),
            });
        }
        if request.client_phone.trim().is_empty() {
            return Err(SchedulingError::Validation {
                field: "client_phone".into(),
                reason: "must not be empty".into(),
            });
        }
        let date = parse_date(&request.date)?;
        let start_time = parse_time(&request.start_time)?;

        let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;

        let service = get_service(&tx, &request.service_id)?.ok_or_else(|| {
            SchedulingError::NotFound {
                entity_type: "service".to_string(),
                id: request.service_id.to_string(),
            }
        })?;

        if let Some(employee_id) = &request.employee_id {
            let employee =
                get_employee(&tx, employee_id)?.ok_or_else(|| SchedulingError::NotFound {
                    entity_type: "employee".to_string(),
                    id: employee_id.to_string(),
                })?;
            check_within_hours(&employee, date, start_time, service.duration_minutes)?;
        }

        if has_conflict(
            &tx,
            &self.config,
            request.employee_id.as_ref(),
            date,
            start_time,
            service.duration_minutes,
            None,
        )? {
            return Err(SchedulingError::SlotUnavailable {
                date,
                start_time,
                reason: "overlaps an existing appointment".into(),
            });
        }

        let now = Utc::now().naive_utc();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            service_id: request.service_id,
            employee_id: request.employee_id,
            client_name: request.client_name.trim().to_string(),
            client_phone: request.client_phone.trim().to_string(),
            client_email: request.client_email.clone(),
            date,
            start_time,
            status: initial_status(request.source),
            notes: request.notes.clone(),
            actual_start_time: None,
            actual_end_time: None,
            reschedule_reason: None,
            new_date: None,
            new_time: None,
            arrival_time: None,
            created_at: now,
            updated_at: now,
        };
        insert_appointment(&tx, &appointment)?;
        tx.commit().map_err(DatabaseError::from)?;

        tracing::info!(
            "Appointment {} created as {} for {} {}",
            appointment.id,
            appointment.status.as_str(),
            request.date,
            request.start_time
        );
        self.broadcaster.notify_appointment_changed(&appointment.id);
        Ok(appointment)
    }

    /// Drives the state machine. The write is predicated on the status the
    /// record had when loaded, so a concurrent transition surfaces as
    /// ConcurrentModification instead of silently winning. Entering
    /// in_progress stamps the actual start; entering completed stamps the
    /// actual end and requires a recorded start.
    pub fn update_status(
        &self,
        conn: &Connection,
        id: &Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;

        let current =
            get_appointment(&tx, id)?.ok_or_else(|| SchedulingError::NotFound {
                entity_type: "appointment".to_string(),
                id: id.to_string(),
            })?;

        validate_transition(current.status, new_status)?;

        if new_status == AppointmentStatus::Rescheduled {
            return Err(SchedulingError::Validation {
                field: "status".into(),
                reason: "rescheduling carries a new date and time; use reschedule()".into(),
            });
        }

        let mut fields = AppointmentUpdate {
            status: Some(new_status),
            ..Default::default()
        };
        let now = Utc::now().naive_utc();
        match new_status {
            AppointmentStatus::InProgress => {
                fields.actual_start_time = Some(now);
            }
            AppointmentStatus::Completed => {
                if current.actual_start_time.is_none() {
                    return Err(SchedulingError::Validation {
                        field: "actual_start_time".into(),
                        reason: "cannot complete an appointment that never started".into(),
                    });
                }
                fields.actual_end_time = Some(now);
            }
            _ => {}
        }

        update_appointment_fields(&tx, id, Some(&current.status), &fields)?;

        let updated =
            get_appointment(&tx, id)?.ok_or_else(|| SchedulingError::NotFound {
                entity_type: "appointment".to_string(),
                id: id.to_string(),
            })?;
        tx.commit().map_err(DatabaseError::from)?;

        tracing::info!(
            "Appointment {} moved {} -> {}",
            id,
            current.status.as_str(),
            new_status.as_str()
        );
        self.broadcaster.notify_appointment_changed(id);
        Ok(updated)
    }

    /// Moves an appointment to a new date/time. The record becomes
    /// terminal `rescheduled` and carries the target slot; no new record
    /// is created. The target is conflict-checked against everything but
    /// the appointment itself.
    pub fn reschedule(
        &self,
        conn: &Connection,
        id: &Uuid,
        new_date: &str,
        new_time: &str,
        reason: Option<String>,
    ) -> Result<Appointment, SchedulingError> {
        let target_date = parse_date(new_date)?;
        let target_time = parse_time(new_time)?;

        let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;

        let current =
            get_appointment(&tx, id)?.ok_or_else(|| SchedulingError::NotFound {
                entity_type: "appointment".to_string(),
                id: id.to_string(),
            })?;

        validate_transition(current.status, AppointmentStatus::Rescheduled)?;

        let service = get_service(&tx, &current.service_id)?.ok_or_else(|| {
            SchedulingError::NotFound {
                entity_type: "service".to_string(),
                id: current.service_id.to_string(),
            }
        })?;

        if let Some(employee_id) = &current.employee_id {
            let employee =
                get_employee(&tx, employee_id)?.ok_or_else(|| SchedulingError::NotFound {
                    entity_type: "employee".to_string(),
                    id: employee_id.to_string(),
                })?;
            check_within_hours(&employee, target_date, target_time, service.duration_minutes)?;
        }

        if has_conflict(
            &tx,
            &self.config,
            current.employee_id.as_ref(),
            target_date,
            target_time,
            service.duration_minutes,
            Some(id),
        )? {
            return Err(SchedulingError::SlotUnavailable {
                date: target_date,
                start_time: target_time,
                reason: "overlaps an existing appointment".into(),
            });
        }

        let fields = AppointmentUpdate {
            status: Some(AppointmentStatus::Rescheduled),
            new_date: Some(target_date),
            new_time: Some(target_time),
            reschedule_reason: reason,
            ..Default::default()
        };
        update_appointment_fields(&tx, id, Some(&current.status), &fields)?;

        let updated =
            get_appointment(&tx, id)?.ok_or_else(|| SchedulingError::NotFound {
                entity_type: "appointment".to_string(),
                id: id.to_string(),
            })?;
        tx.commit().map_err(DatabaseError::from)?;

        tracing::info!("Appointment {id} rescheduled to {new_date} {new_time}");
        self.broadcaster.notify_appointment_changed(id);
        Ok(updated)
    }

    /// Hard removal, any status. Cancellation is the history-preserving
    /// path; this one exists for operator cleanup.
    pub fn delete_appointment(&self, conn: &Connection, id: &Uuid) -> Result<(), SchedulingError> {
        delete_appointment(conn, id)?;

        tracing::info!("Appointment {id} deleted");
        self.broadcaster.notify_appointment_changed(id);
        Ok(())
    }

    /// Stamps the client's arrival on a still-live appointment. Feeds the
    /// late-arrival workflow. The write is predicated on the status the
    /// record was loaded with, so an appointment that turns terminal
    /// underneath fails as ConcurrentModification instead of getting an
    /// arrival stamped onto a closed record.
    pub fn record_arrival(
        &self,
        conn: &Connection,
        id: &Uuid,
    ) -> Result<Appointment, SchedulingError> {
        let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;

        let current =
            get_appointment(&tx, id)?.ok_or_else(|| SchedulingError::NotFound {
                entity_type: "appointment".to_string(),
                id: id.to_string(),
            })?;
        if current.status.is_terminal() {
            return Err(SchedulingError::Validation {
                field: "status".into(),
                reason: format!(
                    "cannot record arrival on a {} appointment",
                    current.status.as_str()
                ),
            });
        }

        update_appointment_fields(
            &tx,
            id,
            Some(&current.status),
            &AppointmentUpdate {
                arrival_time: Some(Utc::now().naive_utc()),
                ..Default::default()
            },
        )?;

        let updated =
            get_appointment(&tx, id)?.ok_or_else(|| SchedulingError::NotFound {
                entity_type: "appointment".to_string(),
                id: id.to_string(),
            })?;
        tx.commit().map_err(DatabaseError::from)?;

        tracing::debug!("Arrival recorded for appointment {id}");
        self.broadcaster.notify_appointment_changed(id);
        Ok(updated)
    }

    /// Slot listing for the client booking view: only candidates that can
    /// actually be taken. Dashboards that want the full flagged list use
    /// [`compute_slots`] directly.
    pub fn available_slots(
        &self,
        conn: &Connection,
        employee_id: &Uuid,
        service_id: &Uuid,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, SchedulingError> {
        let service = get_service(conn, service_id)?.ok_or_else(|| SchedulingError::NotFound {
            entity_type: "service".to_string(),
            id: service_id.to_string(),
        })?;
        let slots = compute_slots(conn, &self.config, employee_id, date, service.duration_minutes)?;
        Ok(slots.into_iter().filter(|s| s.available).collect())
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// An assigned employee must be open that weekday and the full service
/// interval must fit inside the window. Unassigned bookings skip this.
fn check_within_hours(
    employee: &Employee,
    date: NaiveDate,
    start_time: NaiveTime,
    duration_minutes: i64,
) -> Result<(), SchedulingError> {
    let Some(window) = employee.hours.for_weekday(date.weekday()) else {
        return Err(SchedulingError::SlotUnavailable {
            date,
            start_time,
            reason: format!("{} is not working that day", employee.name),
        });
    };

    let start = minutes_since_midnight(start_time);
    let end = start + duration_minutes;
    if start < minutes_since_midnight(window.opens_at)
        || end > minutes_since_midnight(window.closes_at)
    {
        return Err(SchedulingError::SlotUnavailable {
            date,
            start_time,
            reason: "outside working hours".into(),
        });
    }
    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate, SchedulingError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| SchedulingError::Validation {
        field: "date".into(),
        reason: format!("expected YYYY-MM-DD, got {s:?}"),
    })
}

fn parse_time(s: &str) -> Result<NaiveTime, SchedulingError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| SchedulingError::Validation {
        field: "time".into(),
        reason: format!("expected HH:MM, got {s:?}"),
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
