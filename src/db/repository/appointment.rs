use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Appointment, AppointmentFilter, AppointmentStatus};

/// One booked interval on an employee's day, with the service duration
/// joined in. Only rows in a blocking status are returned by
/// [`blocking_intervals`].
#[derive(Debug, Clone)]
pub struct BookedInterval {
    pub appointment_id: Uuid,
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
}

/// Field set for a partial update. `None` means leave the column untouched;
/// `updated_at` is always refreshed.
#[derive(Debug, Default)]
pub struct AppointmentUpdate {
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    pub actual_start_time: Option<NaiveDateTime>,
    pub actual_end_time: Option<NaiveDateTime>,
    pub reschedule_reason: Option<String>,
    pub new_date: Option<NaiveDate>,
    pub new_time: Option<NaiveTime>,
    pub arrival_time: Option<NaiveDateTime>,
}

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments
         (id, service_id, employee_id, client_name, client_phone, client_email,
          date, start_time, status, notes, actual_start_time, actual_end_time,
          reschedule_reason, new_date, new_time, arrival_time, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            appt.id.to_string(),
            appt.service_id.to_string(),
            appt.employee_id.map(|id| id.to_string()),
            appt.client_name,
            appt.client_phone,
            appt.client_email,
            appt.date.format("%Y-%m-%d").to_string(),
            appt.start_time.format("%H:%M").to_string(),
            appt.status.as_str(),
            appt.notes,
            appt.actual_start_time.map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            appt.actual_end_time.map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            appt.reschedule_reason,
            appt.new_date.map(|d| d.format("%Y-%m-%d").to_string()),
            appt.new_time.map(|t| t.format("%H:%M").to_string()),
            appt.arrival_time.map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            appt.created_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            appt.updated_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, service_id, employee_id, client_name, client_phone, client_email,
                date, start_time, status, notes, actual_start_time, actual_end_time,
                reschedule_reason, new_date, new_time, arrival_time, created_at, updated_at
         FROM appointments WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], raw_appointment);
    match result {
        Ok(row) => Ok(Some(appointment_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_employee_and_date(
    conn: &Connection,
    employee_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, service_id, employee_id, client_name, client_phone, client_email,
                date, start_time, status, notes, actual_start_time, actual_end_time,
                reschedule_reason, new_date, new_time, arrival_time, created_at, updated_at
         FROM appointments
         WHERE employee_id = ?1 AND date = ?2
         ORDER BY start_time ASC",
    )?;

    let rows = stmt.query_map(
        params![employee_id.to_string(), date.format("%Y-%m-%d").to_string()],
        raw_appointment,
    )?;

    let mut out = Vec::new();
    for row in rows {
        out.push(appointment_from_row(row?)?);
    }
    Ok(out)
}

/// Booked intervals that occupy slots on the given employee/date: rows in
/// status pending, scheduled, confirmed, or in_progress, each joined with
/// its service duration.
pub fn blocking_intervals(
    conn: &Connection,
    employee_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<BookedInterval>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.start_time, s.duration_minutes
         FROM appointments a
         JOIN services s ON s.id = a.service_id
         WHERE a.employee_id = ?1 AND a.date = ?2
           AND a.status IN ('pending', 'scheduled', 'confirmed', 'in_progress')
         ORDER BY a.start_time ASC",
    )?;

    let rows = stmt.query_map(
        params![employee_id.to_string(), date.format("%Y-%m-%d").to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        },
    )?;

    let mut out = Vec::new();
    for row in rows {
        let (id, start, duration) = row?;
        out.push(BookedInterval {
            appointment_id: Uuid::parse_str(&id).unwrap_or_default(),
            start_time: parse_stored_time(&start)?,
            duration_minutes: duration,
        });
    }
    Ok(out)
}

/// Partial update with an optional status predicate. When `expected_status`
/// is given the UPDATE only matches if the stored status still equals it;
/// a miss on an existing row surfaces as `StaleStatus`.
pub fn update_appointment_fields(
    conn: &Connection,
    id: &Uuid,
    expected_status: Option<&AppointmentStatus>,
    fields: &AppointmentUpdate,
) -> Result<(), DatabaseError> {
    let mut sql = String::from("UPDATE appointments SET updated_at = ?1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    params_vec.push(Box::new(
        Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    ));
    let mut param_idx = 2u32;

    if let Some(ref status) = fields.status {
        sql.push_str(&format!(", status = ?{param_idx}"));
        params_vec.push(Box::new(status.as_str().to_string()));
        param_idx += 1;
    }
    if let Some(ref notes) = fields.notes {
        sql.push_str(&format!(", notes = ?{param_idx}"));
        params_vec.push(Box::new(notes.clone()));
        param_idx += 1;
    }
    if let Some(t) = fields.actual_start_time {
        sql.push_str(&format!(", actual_start_time = ?{param_idx}"));
        params_vec.push(Box::new(t.format("%Y-%m-%dT%H:%M:%SZ").to_string()));
        param_idx += 1;
    }
    if let Some(t) = fields.actual_end_time {
        sql.push_str(&format!(", actual_end_time = ?{param_idx}"));
        params_vec.push(Box::new(t.format("%Y-%m-%dT%H:%M:%SZ").to_string()));
        param_idx += 1;
    }
    if let Some(ref reason) = fields.reschedule_reason {
        sql.push_str(&format!(", reschedule_reason = ?{param_idx}"));
        params_vec.push(Box::new(reason.clone()));
        param_idx += 1;
    }
    if let Some(d) = fields.new_date {
        sql.push_str(&format!(", new_date = ?{param_idx}"));
        params_vec.push(Box::new(d.format("%Y-%m-%d").to_string()));
        param_idx += 1;
    }
    if let Some(t) = fields.new_time {
        sql.push_str(&format!(", new_time = ?{param_idx}"));
        params_vec.push(Box::new(t.format("%H:%M").to_string()));
        param_idx += 1;
    }
    if let Some(t) = fields.arrival_time {
        sql.push_str(&format!(", arrival_time = ?{param_idx}"));
        params_vec.push(Box::new(t.format("%Y-%m-%dT%H:%M:%SZ").to_string()));
        param_idx += 1;
    }

    sql.push_str(&format!(" WHERE id = ?{param_idx}"));
    params_vec.push(Box::new(id.to_string()));
    param_idx += 1;

    if let Some(expected) = expected_status {
        sql.push_str(&format!(" AND status = ?{param_idx}"));
        params_vec.push(Box::new(expected.as_str().to_string()));
        param_idx += 1;
    }
    let _ = param_idx; // suppress unused warning

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let changed = conn.execute(&sql, param_refs.as_slice())?;

    if changed == 0 {
        return Err(update_miss(conn, id, expected_status));
    }
    Ok(())
}

/// A zero-row UPDATE either means the id is unknown or, when a status
/// predicate was supplied, that another writer changed the status first.
fn update_miss(
    conn: &Connection,
    id: &Uuid,
    expected_status: Option<&AppointmentStatus>,
) -> DatabaseError {
    if let Some(expected) = expected_status {
        let exists = conn.query_row(
            "SELECT 1 FROM appointments WHERE id = ?1",
            params![id.to_string()],
            |row| row.get::<_, i64>(0),
        );
        if exists.is_ok() {
            return DatabaseError::StaleStatus {
                id: id.to_string(),
                expected: expected.as_str().to_string(),
            };
        }
    }
    DatabaseError::NotFound {
        entity_type: "appointment".to_string(),
        id: id.to_string(),
    }
}

pub fn delete_appointment(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM appointments WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "appointment".to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut sql = String::from(
        "SELECT id, service_id, employee_id, client_name, client_phone, client_email,
                date, start_time, status, notes, actual_start_time, actual_end_time,
                reschedule_reason, new_date, new_time, arrival_time, created_at, updated_at
         FROM appointments
         WHERE 1=1",
    );

    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut param_idx = 1u32;

    if let Some(ref employee_id) = filter.employee_id {
        sql.push_str(&format!(" AND employee_id = ?{param_idx}"));
        params_vec.push(Box::new(employee_id.to_string()));
        param_idx += 1;
    }
    if let Some(ref service_id) = filter.service_id {
        sql.push_str(&format!(" AND service_id = ?{param_idx}"));
        params_vec.push(Box::new(service_id.to_string()));
        param_idx += 1;
    }
    if let Some(ref status) = filter.status {
        sql.push_str(&format!(" AND status = ?{param_idx}"));
        params_vec.push(Box::new(status.as_str().to_string()));
        param_idx += 1;
    }
    if let Some(from) = filter.date_from {
        sql.push_str(&format!(" AND date >= ?{param_idx}"));
        params_vec.push(Box::new(from.format("%Y-%m-%d").to_string()));
        param_idx += 1;
    }
    if let Some(to) = filter.date_to {
        sql.push_str(&format!(" AND date <= ?{param_idx}"));
        params_vec.push(Box::new(to.format("%Y-%m-%d").to_string()));
        param_idx += 1;
    }
    if let Some(ref phone) = filter.client_phone {
        sql.push_str(&format!(" AND client_phone = ?{param_idx}"));
        params_vec.push(Box::new(phone.clone()));
        param_idx += 1;
    }
    let _ = param_idx; // suppress unused warning

    sql.push_str(" ORDER BY date ASC, start_time ASC");

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(param_refs.as_slice(), raw_appointment)?;

    let mut out = Vec::new();
    for row in rows {
        out.push(appointment_from_row(row?)?);
    }
    Ok(out)
}

// ═══════════════════════════════════════════
// Internal row mapping
// ═══════════════════════════════════════════

struct AppointmentRow {
    id: String,
    service_id: String,
    employee_id: Option<String>,
    client_name: String,
    client_phone: String,
    client_email: Option<String>,
    date: String,
    start_time: String,
    status: String,
    notes: Option<String>,
    actual_start_time: Option<String>,
    actual_end_time: Option<String>,
    reschedule_reason: Option<String>,
    new_date: Option<String>,
    new_time: Option<String>,
    arrival_time: Option<String>,
    created_at: String,
    updated_at: String,
}

fn raw_appointment(row: &rusqlite::Row) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        service_id: row.get(1)?,
        employee_id: row.get(2)?,
        client_name: row.get(3)?,
        client_phone: row.get(4)?,
        client_email: row.get(5)?,
        date: row.get(6)?,
        start_time: row.get(7)?,
        status: row.get(8)?,
        notes: row.get(9)?,
        actual_start_time: row.get(10)?,
        actual_end_time: row.get(11)?,
        reschedule_reason: row.get(12)?,
        new_date: row.get(13)?,
        new_time: row.get(14)?,
        arrival_time: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    let status = AppointmentStatus::from_str(&row.status)?;
    Ok(Appointment {
        id: Uuid::parse_str(&row.id).unwrap_or_default(),
        service_id: Uuid::parse_str(&row.service_id).unwrap_or_default(),
        employee_id: row
            .employee_id
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok()),
        client_name: row.client_name,
        client_phone: row.client_phone,
        client_email: row.client_email,
        date: parse_stored_date(&row.date)?,
        start_time: parse_stored_time(&row.start_time)?,
        status,
        notes: row.notes,
        actual_start_time: row
            .actual_start_time
            .as_deref()
            .map(parse_stored_timestamp)
            .transpose()?,
        actual_end_time: row
            .actual_end_time
            .as_deref()
            .map(parse_stored_timestamp)
            .transpose()?,
        reschedule_reason: row.reschedule_reason,
        new_date: row.new_date.as_deref().map(parse_stored_date).transpose()?,
        new_time: row.new_time.as_deref().map(parse_stored_time).transpose()?,
        arrival_time: row
            .arrival_time
            .as_deref()
            .map(parse_stored_timestamp)
            .transpose()?,
        created_at: parse_stored_timestamp(&row.created_at)?,
        updated_at: parse_stored_timestamp(&row.updated_at)?,
    })
}

fn parse_stored_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| DatabaseError::ConstraintViolation(format!("malformed stored date: {s}")))
}

fn parse_stored_time(s: &str) -> Result<NaiveTime, DatabaseError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| DatabaseError::ConstraintViolation(format!("malformed stored time: {s}")))
}

fn parse_stored_timestamp(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ")
        .map_err(|_| DatabaseError::ConstraintViolation(format!("malformed stored timestamp: {s}")))
}
