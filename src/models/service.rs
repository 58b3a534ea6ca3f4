use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: i64,
    /// Integer minor-currency units (cents). Never a float.
    pub price_cents: i64,
    pub created_at: NaiveDateTime,
}
