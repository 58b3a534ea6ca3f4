//! Change broadcasting — keeps every schedule view converging on the
//! same state.
//!
//! Two pieces work together. The [`ChangeBroadcaster`] trait is the push
//! side: the scheduler calls it exactly once after each committed
//! mutation. The version counters are the pull side: each entity type has
//! a monotonic counter bumped by triggers, so a dashboard that reconnects
//! can ask "what changed since my snapshot" instead of refetching
//! everything.

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::DatabaseError;

// ═══════════════════════════════════════════
// Broadcaster
// ═══════════════════════════════════════════

/// Receives a notification after every committed appointment mutation.
/// Implementations must tolerate being called from any thread.
pub trait ChangeBroadcaster: Send + Sync {
    fn notify_appointment_changed(&self, appointment_id: &Uuid);
}

/// Default broadcaster: logs the change and nothing more. Deployments
/// wire their real fan-out (push channel, webhook) behind the same trait.
pub struct LogBroadcaster;

impl ChangeBroadcaster for LogBroadcaster {
    fn notify_appointment_changed(&self, appointment_id: &Uuid) {
        tracing::info!("Appointment {appointment_id} changed; schedule views should refresh");
    }
}

// ═══════════════════════════════════════════
// Version Counters
// ═══════════════════════════════════════════

/// Version counters for the three entity types that shape a schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleVersions {
    pub appointments: i64,
    pub services: i64,
    pub employees: i64,
}

/// Current version counters. Triggers bump these on every write, so the
/// values reflect committed state only.
pub fn get_schedule_versions(conn: &Connection) -> Result<ScheduleVersions, DatabaseError> {
    let mut versions = ScheduleVersions::default();

    let mut stmt = conn.prepare("SELECT entity_type, version FROM schedule_versions")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    for row in rows {
        let (entity_type, version) = row?;
        match entity_type.as_str() {
            "appointments" => versions.appointments = version,
            "services" => versions.services = version,
            "employees" => versions.employees = version,
            _ => {}
        }
    }

    Ok(versions)
}

/// Entity types whose counter moved past what the client knows. An empty
/// result means the client's snapshot is current.
pub fn diff_versions(known: &ScheduleVersions, current: &ScheduleVersions) -> Vec<String> {
    let mut changed = Vec::new();
    if known.appointments < current.appointments {
        changed.push("appointments".to_string());
    }
    if known.services < current.services {
        changed.push("services".to_string());
    }
    if known.employees < current.employees {
        changed.push("employees".to_string());
    }
    changed
}

// ═══════════════════════════════════════════
// Schedule Payload Assembly
// ═══════════════════════════════════════════

/// One row in an employee's day view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayScheduleEntry {
    pub appointment_id: String,
    pub client_name: String,
    pub client_phone: String,
    pub service_name: String,
    pub start_time: String, // HH:MM
    pub duration_minutes: i64,
    pub status: String,
}

/// An employee's full day, plus the version snapshot it was read at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub employee_id: String,
    pub date: String, // YYYY-MM-DD
    pub entries: Vec<DayScheduleEntry>,
    pub versions: ScheduleVersions,
}

/// Assemble the day view a merchant dashboard renders: every appointment
/// for the employee on that date, in start order, with the service
/// joined in.
pub fn assemble_day_schedule(
    conn: &Connection,
    employee_id: &Uuid,
    date: NaiveDate,
) -> Result<DaySchedule, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.client_name, a.client_phone, a.start_time, a.status,
                s.name AS service_name, s.duration_minutes
         FROM appointments a
         JOIN services s ON s.id = a.service_id
         WHERE a.employee_id = ?1 AND a.date = ?2
         ORDER BY a.start_time ASC",
    )?;

    let rows = stmt.query_map(
        params![employee_id.to_string(), date.format("%Y-%m-%d").to_string()],
        |row| {
            Ok(DayScheduleEntry {
                appointment_id: row.get(0)?,
                client_name: row.get(1)?,
                client_phone: row.get(2)?,
                start_time: row.get(3)?,
                status: row.get(4)?,
                service_name: row.get(5)?,
                duration_minutes: row.get(6)?,
            })
        },
    )?;

    let entries: Vec<DayScheduleEntry> = rows
        .map(|r| r.map_err(DatabaseError::from))
        .collect::<Result<_, _>>()?;

    Ok(DaySchedule {
        employee_id: employee_id.to_string(),
        date: date.format("%Y-%m-%d").to_string(),
        entries,
        versions: get_schedule_versions(conn)?,
    })
}
