use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Open/close window for one weekday. Half-open: closes_at itself is not
/// bookable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

/// Working hours for a full week, indexed by days-from-Monday
/// (0 = Monday .. 6 = Sunday). A `None` entry means closed that day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeekSchedule {
    pub days: [Option<DayHours>; 7],
}

impl WeekSchedule {
    pub fn for_weekday(&self, weekday: Weekday) -> Option<DayHours> {
        self.days[weekday.num_days_from_monday() as usize]
    }

    pub fn set(&mut self, weekday: Weekday, hours: DayHours) {
        self.days[weekday.num_days_from_monday() as usize] = Some(hours);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub hours: WeekSchedule,
}
