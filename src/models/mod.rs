pub mod appointment;
pub mod employee;
pub mod enums;
pub mod filters;
pub mod service;
pub mod slot;

pub use appointment::Appointment;
pub use employee::{DayHours, Employee, WeekSchedule};
pub use enums::{AppointmentStatus, BookingSource};
pub use filters::AppointmentFilter;
pub use service::Service;
pub use slot::TimeSlot;
