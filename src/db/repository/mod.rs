//! Repository layer — entity-scoped database operations.
//!
//! All public functions are re-exported here so callers can use
//! `crate::db::repository::*` without caring about the split.

mod appointment;
mod employee;
mod service;

pub use appointment::*;
pub use employee::*;
pub use service::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
    use rusqlite::Connection;
    use uuid::Uuid;

    use crate::db::sqlite::open_memory_database;
    use crate::db::DatabaseError;
    use crate::models::*;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn fixed_now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2026-01-01 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn make_service(conn: &Connection, name: &str, duration_minutes: i64) -> Uuid {
        let id = Uuid::new_v4();
        insert_service(
            conn,
            &Service {
                id,
                name: name.into(),
                duration_minutes,
                price_cents: 2500,
                created_at: fixed_now(),
            },
        )
        .unwrap();
        id
    }

    /// Employee open Monday through Saturday, 09:00–18:00.
    fn make_employee(conn: &Connection, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        let mut hours = WeekSchedule::default();
        for weekday in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ] {
            hours.set(
                weekday,
                DayHours {
                    opens_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    closes_at: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                },
            );
        }
        insert_employee(
            conn,
            &Employee {
                id,
                name: name.into(),
                hours,
            },
        )
        .unwrap();
        id
    }

    fn make_appointment(
        conn: &Connection,
        service_id: Uuid,
        employee_id: Option<Uuid>,
        date: &str,
        time: &str,
        status: AppointmentStatus,
    ) -> Uuid {
        let id = Uuid::new_v4();
        insert_appointment(
            conn,
            &Appointment {
                id,
                service_id,
                employee_id,
                client_name: "Ana Demir".into(),
                client_phone: "555-0100".into(),
                client_email: None,
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                start_time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
                status,
                notes: None,
                actual_start_time: None,
                actual_end_time: None,
                reschedule_reason: None,
                new_date: None,
                new_time: None,
                arrival_time: None,
                created_at: fixed_now(),
                updated_at: fixed_now(),
            },
        )
        .unwrap();
        id
    }

    #[test]
    fn service_insert_and_retrieve() {
        let conn = test_db();
        let id = make_service(&conn, "Haircut", 45);
        let service = get_service(&conn, &id).unwrap().unwrap();
        assert_eq!(service.name, "Haircut");
        assert_eq!(service.duration_minutes, 45);
        assert_eq!(service.price_cents, 2500);
    }

    #[test]
    fn service_rejects_non_positive_duration() {
        let conn = test_db();
        let result = insert_service(
            &conn,
            &Service {
                id: Uuid::new_v4(),
                name: "Broken".into(),
                duration_minutes: 0,
                price_cents: 1000,
                created_at: fixed_now(),
            },
        );
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
    }

    #[test]
    fn service_rejects_negative_price() {
        let conn = test_db();
        let result = insert_service(
            &conn,
            &Service {
                id: Uuid::new_v4(),
                name: "Broken".into(),
                duration_minutes: 30,
                price_cents: -1,
                created_at: fixed_now(),
            },
        );
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
    }

    #[test]
    fn list_services_ordered_by_name() {
        let conn = test_db();
        make_service(&conn, "Shave", 15);
        make_service(&conn, "Color", 90);
        let services = list_services(&conn).unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].name, "Color");
        assert_eq!(services[1].name, "Shave");
    }

    #[test]
    fn delete_service_blocked_by_upcoming_appointment() {
        let conn = test_db();
        let service_id = make_service(&conn, "Haircut", 45);
        make_appointment(
            &conn,
            service_id,
            None,
            "2099-06-01",
            "10:00",
            AppointmentStatus::Pending,
        );
        let result = delete_service(&conn, &service_id);
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
        assert!(get_service(&conn, &service_id).unwrap().is_some());
    }

    #[test]
    fn delete_service_blocked_by_past_appointment() {
        // No upcoming references, but the completed one still holds the
        // row through the foreign key. The refusal must be the same typed
        // error as the upcoming-reference path.
        let conn = test_db();
        let service_id = make_service(&conn, "Haircut", 45);
        make_appointment(
            &conn,
            service_id,
            None,
            "2020-06-01",
            "10:00",
            AppointmentStatus::Completed,
        );
        let result = delete_service(&conn, &service_id);
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
        assert!(get_service(&conn, &service_id).unwrap().is_some());
    }

    #[test]
    fn delete_service_without_references() {
        let conn = test_db();
        let service_id = make_service(&conn, "Haircut", 45);
        delete_service(&conn, &service_id).unwrap();
        assert!(get_service(&conn, &service_id).unwrap().is_none());
    }

    #[test]
    fn delete_service_missing_returns_not_found() {
        let conn = test_db();
        let result = delete_service(&conn, &Uuid::new_v4());
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn employee_insert_and_retrieve_hours() {
        let conn = test_db();
        let id = make_employee(&conn, "Mira");
        let employee = get_employee(&conn, &id).unwrap().unwrap();
        assert_eq!(employee.name, "Mira");

        let monday = employee.hours.for_weekday(Weekday::Mon).unwrap();
        assert_eq!(monday.opens_at, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(monday.closes_at, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert!(employee.hours.for_weekday(Weekday::Sun).is_none());
    }

    #[test]
    fn employee_rejects_inverted_hours() {
        let conn = test_db();
        let mut hours = WeekSchedule::default();
        hours.set(
            Weekday::Mon,
            DayHours {
                opens_at: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                closes_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            },
        );
        let result = insert_employee(
            &conn,
            &Employee {
                id: Uuid::new_v4(),
                name: "Broken".into(),
                hours,
            },
        );
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
    }

    #[test]
    fn delete_employee_unassigns_appointments() {
        let conn = test_db();
        let service_id = make_service(&conn, "Haircut", 45);
        let employee_id = make_employee(&conn, "Mira");
        let appt_id = make_appointment(
            &conn,
            service_id,
            Some(employee_id),
            "2099-06-01",
            "10:00",
            AppointmentStatus::Confirmed,
        );

        delete_employee(&conn, &employee_id).unwrap();

        assert!(get_employee(&conn, &employee_id).unwrap().is_none());
        let appt = get_appointment(&conn, &appt_id).unwrap().unwrap();
        assert!(appt.employee_id.is_none());
    }

    #[test]
    fn appointment_insert_and_retrieve() {
        let conn = test_db();
        let service_id = make_service(&conn, "Haircut", 45);
        let employee_id = make_employee(&conn, "Mira");
        let appt_id = make_appointment(
            &conn,
            service_id,
            Some(employee_id),
            "2026-06-01",
            "10:00",
            AppointmentStatus::Scheduled,
        );

        let appt = get_appointment(&conn, &appt_id).unwrap().unwrap();
        assert_eq!(appt.service_id, service_id);
        assert_eq!(appt.employee_id, Some(employee_id));
        assert_eq!(appt.client_name, "Ana Demir");
        assert_eq!(appt.status, AppointmentStatus::Scheduled);
        assert_eq!(
            appt.start_time,
            NaiveTime::from_hms_opt(10, 0, 0).unwrap()
        );
        assert!(appt.actual_start_time.is_none());
    }

    #[test]
    fn appointment_get_missing_returns_none() {
        let conn = test_db();
        assert!(get_appointment(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn appointment_requires_existing_service() {
        let conn = test_db();
        let result = insert_appointment(
            &conn,
            &Appointment {
                id: Uuid::new_v4(),
                service_id: Uuid::new_v4(), // Non-existent service
                employee_id: None,
                client_name: "Ana Demir".into(),
                client_phone: "555-0100".into(),
                client_email: None,
                date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
                start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                status: AppointmentStatus::Pending,
                notes: None,
                actual_start_time: None,
                actual_end_time: None,
                reschedule_reason: None,
                new_date: None,
                new_time: None,
                arrival_time: None,
                created_at: fixed_now(),
                updated_at: fixed_now(),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn find_by_employee_and_date_ordered_by_start() {
        let conn = test_db();
        let service_id = make_service(&conn, "Haircut", 45);
        let employee_id = make_employee(&conn, "Mira");
        make_appointment(
            &conn,
            service_id,
            Some(employee_id),
            "2026-06-01",
            "14:00",
            AppointmentStatus::Pending,
        );
        make_appointment(
            &conn,
            service_id,
            Some(employee_id),
            "2026-06-01",
            "09:30",
            AppointmentStatus::Pending,
        );
        make_appointment(
            &conn,
            service_id,
            Some(employee_id),
            "2026-06-02",
            "08:00",
            AppointmentStatus::Pending,
        );

        let day = find_by_employee_and_date(
            &conn,
            &employee_id,
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        )
        .unwrap();
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].start_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(day[1].start_time, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
    }

    #[test]
    fn blocking_intervals_skip_non_blocking_statuses() {
        let conn = test_db();
        let service_id = make_service(&conn, "Haircut", 45);
        let employee_id = make_employee(&conn, "Mira");
        make_appointment(
            &conn,
            service_id,
            Some(employee_id),
            "2026-06-01",
            "10:00",
            AppointmentStatus::Confirmed,
        );
        make_appointment(
            &conn,
            service_id,
            Some(employee_id),
            "2026-06-01",
            "12:00",
            AppointmentStatus::Cancelled,
        );
        make_appointment(
            &conn,
            service_id,
            Some(employee_id),
            "2026-06-01",
            "15:00",
            AppointmentStatus::NoShow,
        );

        let intervals = blocking_intervals(
            &conn,
            &employee_id,
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        )
        .unwrap();
        assert_eq!(intervals.len(), 1);
        assert_eq!(
            intervals[0].start_time,
            NaiveTime::from_hms_opt(10, 0, 0).unwrap()
        );
        assert_eq!(intervals[0].duration_minutes, 45);
    }

    #[test]
    fn update_fields_sets_status_and_timestamp() {
        let conn = test_db();
        let service_id = make_service(&conn, "Haircut", 45);
        let appt_id = make_appointment(
            &conn,
            service_id,
            None,
            "2026-06-01",
            "10:00",
            AppointmentStatus::Confirmed,
        );

        let start = NaiveDateTime::parse_from_str("2026-06-01 10:02:11", "%Y-%m-%d %H:%M:%S").unwrap();
        update_appointment_fields(
            &conn,
            &appt_id,
            None,
            &AppointmentUpdate {
                status: Some(AppointmentStatus::InProgress),
                actual_start_time: Some(start),
                ..Default::default()
            },
        )
        .unwrap();

        let appt = get_appointment(&conn, &appt_id).unwrap().unwrap();
        assert_eq!(appt.status, AppointmentStatus::InProgress);
        assert_eq!(appt.actual_start_time, Some(start));
        assert!(appt.updated_at > appt.created_at);
    }

    #[test]
    fn update_fields_cas_matches_expected_status() {
        let conn = test_db();
        let service_id = make_service(&conn, "Haircut", 45);
        let appt_id = make_appointment(
            &conn,
            service_id,
            None,
            "2026-06-01",
            "10:00",
            AppointmentStatus::Pending,
        );

        update_appointment_fields(
            &conn,
            &appt_id,
            Some(&AppointmentStatus::Pending),
            &AppointmentUpdate {
                status: Some(AppointmentStatus::Confirmed),
                ..Default::default()
            },
        )
        .unwrap();

        let appt = get_appointment(&conn, &appt_id).unwrap().unwrap();
        assert_eq!(appt.status, AppointmentStatus::Confirmed);
    }

    #[test]
    fn update_fields_stale_status_predicate() {
        let conn = test_db();
        let service_id = make_service(&conn, "Haircut", 45);
        let appt_id = make_appointment(
            &conn,
            service_id,
            None,
            "2026-06-01",
            "10:00",
            AppointmentStatus::Confirmed,
        );

        // Another writer already moved it past pending.
        let result = update_appointment_fields(
            &conn,
            &appt_id,
            Some(&AppointmentStatus::Pending),
            &AppointmentUpdate {
                status: Some(AppointmentStatus::Cancelled),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(DatabaseError::StaleStatus { .. })));

        let appt = get_appointment(&conn, &appt_id).unwrap().unwrap();
        assert_eq!(appt.status, AppointmentStatus::Confirmed);
    }

    #[test]
    fn update_fields_missing_appointment() {
        let conn = test_db();
        let result = update_appointment_fields(
            &conn,
            &Uuid::new_v4(),
            None,
            &AppointmentUpdate {
                status: Some(AppointmentStatus::Cancelled),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn delete_appointment_removes_row() {
        let conn = test_db();
        let service_id = make_service(&conn, "Haircut", 45);
        let appt_id = make_appointment(
            &conn,
            service_id,
            None,
            "2026-06-01",
            "10:00",
            AppointmentStatus::Completed,
        );

        delete_appointment(&conn, &appt_id).unwrap();
        assert!(get_appointment(&conn, &appt_id).unwrap().is_none());

        let result = delete_appointment(&conn, &appt_id);
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn list_appointments_filters_combine() {
        let conn = test_db();
        let service_id = make_service(&conn, "Haircut", 45);
        let other_service = make_service(&conn, "Shave", 15);
        let employee_id = make_employee(&conn, "Mira");

        make_appointment(
            &conn,
            service_id,
            Some(employee_id),
            "2026-06-01",
            "10:00",
            AppointmentStatus::Confirmed,
        );
        make_appointment(
            &conn,
            service_id,
            Some(employee_id),
            "2026-06-03",
            "11:00",
            AppointmentStatus::Cancelled,
        );
        make_appointment(
            &conn,
            other_service,
            None,
            "2026-06-05",
            "12:00",
            AppointmentStatus::Confirmed,
        );

        let all = list_appointments(&conn, &AppointmentFilter::default()).unwrap();
        assert_eq!(all.len(), 3);

        let confirmed = list_appointments(
            &conn,
            &AppointmentFilter {
                status: Some(AppointmentStatus::Confirmed),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(confirmed.len(), 2);

        let narrowed = list_appointments(
            &conn,
            &AppointmentFilter {
                employee_id: Some(employee_id),
                status: Some(AppointmentStatus::Confirmed),
                date_to: Some(NaiveDate::from_ymd_opt(2026, 6, 2).unwrap()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].date, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
    }
}
