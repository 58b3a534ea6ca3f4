use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "Slotwise";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
/// ~/Slotwise/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Slotwise")
}

/// Get the default database path
pub fn database_path() -> PathBuf {
    app_data_dir().join("slotwise.db")
}

/// Default tracing filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Tunables for slot computation and conflict checking.
///
/// The granularity is the step between candidate start times. The buffer
/// is cleanup/turnaround time appended to every appointment during
/// conflict checks only; it never shortens the window a booking must fit
/// into. The consuming operations validate both: granularity must be
/// positive, the buffer non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    pub slot_granularity_minutes: i64,
    pub booking_buffer_minutes: i64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_granularity_minutes: 30,
            booking_buffer_minutes: 0,
        }
    }
}
