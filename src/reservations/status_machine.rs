use crate::reservations::ReservationStatus;

/// Service for validating reservation status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Booked → Completed, Cancelled
    /// - Completed, Cancelled → (terminal, no further transitions)
    /// - Any status → Same status (idempotent)
    pub fn is_valid_transition(from: ReservationStatus, to: ReservationStatus) -> bool {
        // Same status is always valid (idempotent)
        if from == to {
            return true;
        }

        match (from, to) {
            (ReservationStatus::Booked, ReservationStatus::Completed) => true,
            (ReservationStatus::Booked, ReservationStatus::Cancelled) => true,

            // Completed and Cancelled are terminal
            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    ///
    /// Returns `Ok(to)` if the transition is valid, `Err(message)` otherwise.
    pub fn transition(
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<ReservationStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!("Invalid status transition from {} to {}", from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booked_to_completed() {
        assert!(StatusMachine::is_valid_transition(
            ReservationStatus::Booked,
            ReservationStatus::Completed
        ));
    }

    #[test]
    fn test_booked_to_cancelled() {
        assert!(StatusMachine::is_valid_transition(
            ReservationStatus::Booked,
            ReservationStatus::Cancelled
        ));
    }

    #[test]
    fn test_cancelled_to_booked() {
        assert!(!StatusMachine::is_valid_transition(
            ReservationStatus::Cancelled,
            ReservationStatus::Booked
        ));
    }

    #[test]
    fn test_completed_to_booked() {
        assert!(!StatusMachine::is_valid_transition(
            ReservationStatus::Completed,
            ReservationStatus::Booked
        ));
    }

    #[test]
    fn test_completed_to_cancelled() {
        assert!(!StatusMachine::is_valid_transition(
            ReservationStatus::Completed,
            ReservationStatus::Cancelled
        ));
    }

    #[test]
    fn test_cancelled_to_completed() {
        assert!(!StatusMachine::is_valid_transition(
            ReservationStatus::Cancelled,
            ReservationStatus::Completed
        ));
    }

    #[test]
    fn test_same_status_is_idempotent() {
        for status in [
            ReservationStatus::Booked,
            ReservationStatus::Completed,
            ReservationStatus::Cancelled,
        ] {
            assert!(StatusMachine::is_valid_transition(status, status));
        }
    }

    #[test]
    fn test_transition_valid() {
        let result = StatusMachine::transition(
            ReservationStatus::Booked,
            ReservationStatus::Cancelled,
        );
        assert_eq!(result.unwrap(), ReservationStatus::Cancelled);
    }

    #[test]
    fn test_transition_invalid() {
        let result = StatusMachine::transition(
            ReservationStatus::Cancelled,
            ReservationStatus::Booked,
        );
        assert!(result.unwrap_err().contains("Invalid status transition"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn status_strategy() -> impl Strategy<Value = ReservationStatus> {
        prop_oneof![
            Just(ReservationStatus::Booked),
            Just(ReservationStatus::Completed),
            Just(ReservationStatus::Cancelled),
        ]
    }

    /// Terminal statuses admit no transition except to themselves
    #[test]
    fn prop_terminal_statuses_are_terminal() {
        proptest!(|(to in status_strategy())| {
            for terminal in [ReservationStatus::Completed, ReservationStatus::Cancelled] {
                if to != terminal {
                    prop_assert!(!StatusMachine::is_valid_transition(terminal, to));
                }
            }
        });
    }

    /// transition() and is_valid_transition() agree
    #[test]
    fn prop_transition_consistency() {
        proptest!(|(from in status_strategy(), to in status_strategy())| {
            let is_valid = StatusMachine::is_valid_transition(from, to);
            let result = StatusMachine::transition(from, to);
            if is_valid {
                prop_assert_eq!(result.unwrap(), to);
            } else {
                prop_assert!(result.is_err());
            }
        });
    }
}
