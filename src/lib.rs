pub mod broadcast; // Change fan-out + schedule version counters
pub mod config;
pub mod db;
pub mod models;
pub mod scheduling; // Slots, conflicts, lifecycle, booking

use tracing_subscriber::EnvFilter;

pub use broadcast::{ChangeBroadcaster, LogBroadcaster, ScheduleVersions};
pub use config::SchedulingConfig;
pub use db::DatabaseError;
pub use models::{
    Appointment, AppointmentStatus, BookingSource, Employee, Service, TimeSlot, WeekSchedule,
};
pub use scheduling::{BookingRequest, Scheduler, SchedulingError};

/// Install the global tracing subscriber. Call once near process start.
/// Honours RUST_LOG; falls back to crate-level info.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
