use chrono::NaiveTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{DayHours, Employee, WeekSchedule};

/// Writes the employee row and one hours row per open weekday in a single
/// transaction.
pub fn insert_employee(conn: &Connection, employee: &Employee) -> Result<(), DatabaseError> {
    for (weekday, hours) in employee.hours.days.iter().enumerate() {
        if let Some(h) = hours {
            if h.opens_at >= h.closes_at {
                return Err(DatabaseError::ConstraintViolation(format!(
                    "employee hours for weekday {weekday} must open before they close"
                )));
            }
        }
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO employees (id, name) VALUES (?1, ?2)",
        params![employee.id.to_string(), employee.name],
    )?;
    for (weekday, hours) in employee.hours.days.iter().enumerate() {
        if let Some(h) = hours {
            tx.execute(
                "INSERT INTO employee_hours (employee_id, weekday, opens_at, closes_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    employee.id.to_string(),
                    weekday as i64,
                    h.opens_at.format("%H:%M").to_string(),
                    h.closes_at.format("%H:%M").to_string(),
                ],
            )?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn get_employee(conn: &Connection, id: &Uuid) -> Result<Option<Employee>, DatabaseError> {
    let name: String = match conn.query_row(
        "SELECT name FROM employees WHERE id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    ) {
        Ok(name) => name,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut hours = WeekSchedule::default();
    let mut stmt = conn.prepare(
        "SELECT weekday, opens_at, closes_at FROM employee_hours WHERE employee_id = ?1",
    )?;
    let rows = stmt.query_map(params![id.to_string()], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (weekday, opens, closes) = row?;
        if !(0..7).contains(&weekday) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "weekday out of range in employee_hours: {weekday}"
            )));
        }
        hours.days[weekday as usize] = Some(DayHours {
            opens_at: parse_hours_time(&opens)?,
            closes_at: parse_hours_time(&closes)?,
        });
    }

    Ok(Some(Employee {
        id: *id,
        name,
        hours,
    }))
}

pub fn list_employees(conn: &Connection) -> Result<Vec<Employee>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id FROM employees ORDER BY name ASC")?;
    let ids = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut out = Vec::new();
    for id in ids {
        let id = Uuid::parse_str(&id?).unwrap_or_default();
        if let Some(employee) = get_employee(conn, &id)? {
            out.push(employee);
        }
    }
    Ok(out)
}

/// Hours rows cascade away; appointments keep their row but lose the
/// assignment (employee_id set to NULL by the schema).
pub fn delete_employee(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM employees WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "employee".to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn parse_hours_time(s: &str) -> Result<NaiveTime, DatabaseError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| DatabaseError::ConstraintViolation(format!("malformed time in employee_hours: {s}")))
}
