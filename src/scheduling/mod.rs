//! Scheduling core: slot computation, conflict detection, the appointment
//! state machine, and the booking operations that tie them together.
//!
//! The module splits along those seams:
//! - `slots` walks an employee's working window and flags each candidate
//!   start against existing bookings
//! - `conflict` is the one overlap rule everything else defers to
//! - `lifecycle` owns the status transition table and its side effects
//! - `booking` is the mutation surface; it validates, checks conflicts and
//!   transitions inside a transaction, and broadcasts after commit
//!
//! All interval math is half-open: an appointment occupies
//! `[start, start + duration)`, so back-to-back bookings never collide.

pub mod booking;
pub mod conflict;
pub mod error;
pub mod lifecycle;
pub mod slots;

pub use booking::{BookingRequest, Scheduler};
pub use conflict::{has_conflict, intervals_overlap};
pub use error::SchedulingError;
pub use lifecycle::{initial_status, valid_transitions, validate_transition};
pub use slots::compute_slots;
