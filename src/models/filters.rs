use chrono::NaiveDate;
use uuid::Uuid;

use super::enums::AppointmentStatus;

#[derive(Debug, Default)]
pub struct AppointmentFilter {
    pub employee_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub client_phone: Option<String>,
}
