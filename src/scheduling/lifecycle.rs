//! Appointment status state machine.
//!
//! The transition table here is the single source of truth for what a
//! status may become next. Side effects of a transition (timestamps,
//! reschedule fields) live with the booking operations, not here.

use crate::models::{AppointmentStatus, BookingSource};

use super::SchedulingError;

/// Statuses reachable from `from` in one step. Terminal statuses return
/// an empty list. Every non-terminal status may also become rescheduled.
pub fn valid_transitions(from: AppointmentStatus) -> Vec<AppointmentStatus> {
    use AppointmentStatus::*;
    match from {
        Pending => vec![Scheduled, Confirmed, Cancelled, Rescheduled],
        Scheduled => vec![Confirmed, Cancelled, Late, Rescheduled],
        Confirmed => vec![InProgress, Cancelled, Late, NoShow, Rescheduled],
        InProgress => vec![Completed, Cancelled, Rescheduled],
        Late => vec![Confirmed, InProgress, NoShow, Cancelled, Rescheduled],
        Completed | Cancelled | NoShow | Rescheduled => vec![],
    }
}

pub fn validate_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), SchedulingError> {
    if valid_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(SchedulingError::InvalidTransition { from, to })
    }
}

/// Client self-service bookings await confirmation; merchant-created ones
/// are already agreed with the client.
pub fn initial_status(source: BookingSource) -> AppointmentStatus {
    match source {
        BookingSource::Client => AppointmentStatus::Pending,
        BookingSource::Merchant => AppointmentStatus::Scheduled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    const ALL_STATUSES: [AppointmentStatus; 9] = [
        Pending, Scheduled, Confirmed, InProgress, Completed, Cancelled, Late, NoShow, Rescheduled,
    ];

    #[test]
    fn listed_transitions_are_allowed() {
        for from in ALL_STATUSES {
            for to in valid_transitions(from) {
                assert!(
                    validate_transition(from, to).is_ok(),
                    "{from:?} -> {to:?} should be allowed"
                );
            }
        }
    }

    #[test]
    fn unlisted_transitions_are_rejected() {
        for from in ALL_STATUSES {
            let allowed = valid_transitions(from);
            for to in ALL_STATUSES {
                if allowed.contains(&to) {
                    continue;
                }
                let err = validate_transition(from, to).unwrap_err();
                assert!(
                    matches!(
                        err,
                        SchedulingError::InvalidTransition { from: f, to: t }
                            if f == from && t == to
                    ),
                    "{from:?} -> {to:?} should be InvalidTransition"
                );
            }
        }
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in ALL_STATUSES {
            assert!(
                validate_transition(status, status).is_err(),
                "{status:?} -> {status:?} should be rejected"
            );
        }
    }

    #[test]
    fn terminal_statuses_have_no_exits() {
        for status in [Completed, Cancelled, NoShow, Rescheduled] {
            assert!(valid_transitions(status).is_empty());
            assert!(status.is_terminal());
        }
    }

    #[test]
    fn every_non_terminal_can_reschedule() {
        for status in ALL_STATUSES {
            if status.is_terminal() {
                continue;
            }
            assert!(
                valid_transitions(status).contains(&Rescheduled),
                "{status:?} should allow rescheduling"
            );
        }
    }

    #[test]
    fn initial_status_follows_booking_source() {
        assert_eq!(initial_status(BookingSource::Client), Pending);
        assert_eq!(initial_status(BookingSource::Merchant), Scheduled);
    }
}
