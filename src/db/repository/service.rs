use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Service;

pub fn insert_service(conn: &Connection, service: &Service) -> Result<(), DatabaseError> {
    if service.duration_minutes <= 0 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "service duration must be positive, got {}",
            service.duration_minutes
        )));
    }
    if service.price_cents < 0 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "service price must not be negative, got {}",
            service.price_cents
        )));
    }

    conn.execute(
        "INSERT INTO services (id, name, duration_minutes, price_cents, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            service.id.to_string(),
            service.name,
            service.duration_minutes,
            service.price_cents,
            service.created_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &Uuid) -> Result<Option<Service>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, duration_minutes, price_cents, created_at
         FROM services WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], |row| {
        Ok(Service {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            name: row.get(1)?,
            duration_minutes: row.get(2)?,
            price_cents: row.get(3)?,
            created_at: NaiveDateTime::parse_from_str(
                &row.get::<_, String>(4)?,
                "%Y-%m-%dT%H:%M:%SZ",
            )
            .unwrap_or_default(),
        })
    });

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_services(conn: &Connection) -> Result<Vec<Service>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, duration_minutes, price_cents, created_at
         FROM services ORDER BY name ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Service {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            name: row.get(1)?,
            duration_minutes: row.get(2)?,
            price_cents: row.get(3)?,
            created_at: NaiveDateTime::parse_from_str(
                &row.get::<_, String>(4)?,
                "%Y-%m-%dT%H:%M:%SZ",
            )
            .unwrap_or_default(),
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Refuses to remove a service that upcoming appointments still reference.
/// Rows referenced only by past appointments are held by the foreign key;
/// that failure is reported as a constraint violation too, so history never
/// dangles and the caller always sees a typed refusal.
pub fn delete_service(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let future_refs: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE service_id = ?1 AND date >= ?2",
        params![id.to_string(), today],
        |row| row.get(0),
    )?;
    if future_refs > 0 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "service {id} is referenced by {future_refs} upcoming appointment(s)"
        )));
    }

    let delete = conn.execute("DELETE FROM services WHERE id = ?1", params![id.to_string()]);
    let changed = match delete {
        Ok(changed) => changed,
        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ffi::ErrorCode::ConstraintViolation,
                ..
            },
            _,
        )) => {
            return Err(DatabaseError::ConstraintViolation(format!(
                "service {id} is referenced by past appointment(s)"
            )));
        }
        Err(e) => return Err(e.into()),
    };
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "service".to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}
