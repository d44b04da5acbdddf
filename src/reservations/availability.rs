// Availability Engine
//
// Decides whether a requested time slot can be booked on a resource.
// One generic path covers both capacity models: tables are exclusive
// (any overlap is a conflict), games are fungible copies (a conflict
// only once every copy is taken by an overlapping booked session).
//
// This is a pure check; serializing it against the subsequent insert is
// the lifecycle service's job.

use crate::catalog::{BookableResource, CapacityModel};
use crate::interval::TimeSlot;
use crate::reservations::error::ReservationResult;
use crate::reservations::store::ReservationStore;

/// Why a booking attempt was turned down
///
/// These are expected, recoverable outcomes of normal operation, carried
/// as values through the create path rather than raised as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Resource exists but is inactive or withdrawn
    ResourceUnavailable,
    /// Table booking's party is larger than the table seats
    CapacityExceeded { requested: i32, capacity: i32 },
    /// The table already has a booked reservation overlapping the slot
    TimeSlotTaken,
    /// Every copy of the game is held by an overlapping booked session
    NoCopiesAvailable,
}

impl ConflictReason {
    /// User-facing wording for the rejection
    pub fn message(&self) -> String {
        match self {
            ConflictReason::ResourceUnavailable => {
                "This resource is not currently available for booking".to_string()
            }
            ConflictReason::CapacityExceeded {
                requested,
                capacity,
            } => format!(
                "Party of {} exceeds the table capacity of {}",
                requested, capacity
            ),
            ConflictReason::TimeSlotTaken => {
                "The table is not available for that time".to_string()
            }
            ConflictReason::NoCopiesAvailable => {
                "No copies of the game are available for that time".to_string()
            }
        }
    }
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Result of an availability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Conflict(ConflictReason),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// Availability Engine
///
/// Stateless; reads booked reservations through the store and applies
/// the resource's capacity model.
pub struct AvailabilityEngine;

impl AvailabilityEngine {
    /// Check whether `slot` can be booked on `resource`
    ///
    /// `guest_count` is the requesting party size, only meaningful for
    /// tables. `exclude` removes one reservation id from the overlap
    /// query, for callers re-checking a record against its own slot.
    pub async fn check<S: ReservationStore>(
        store: &S,
        resource: &BookableResource,
        slot: &TimeSlot,
        guest_count: Option<i32>,
        exclude: Option<i32>,
    ) -> ReservationResult<Availability> {
        if !resource.is_active() {
            return Ok(Availability::Conflict(ConflictReason::ResourceUnavailable));
        }

        // Seat bound gates a single party; it never permits concurrent
        // bookings and runs before any overlap query.
        if let (Some(capacity), Some(requested)) = (resource.seat_capacity(), guest_count) {
            if requested > capacity {
                return Ok(Availability::Conflict(ConflictReason::CapacityExceeded {
                    requested,
                    capacity,
                }));
            }
        }

        let overlapping = store
            .find_overlapping(resource.kind(), resource.id(), slot, exclude)
            .await?;

        let verdict = match resource.capacity_model() {
            CapacityModel::SingleUnit => {
                if overlapping.is_empty() {
                    Availability::Available
                } else {
                    Availability::Conflict(ConflictReason::TimeSlotTaken)
                }
            }
            CapacityModel::MultiUnit(copies) => {
                // Each overlapping booked session holds exactly one copy;
                // copies are fungible, only the count matters.
                if (overlapping.len() as i32) < copies {
                    Availability::Available
                } else {
                    Availability::Conflict(ConflictReason::NoCopiesAvailable)
                }
            }
        };

        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{GameResource, ResourceKind, TableResource};
    use crate::reservations::models::{NewReservation, ReservationDetails, ReservationStatus};
    use crate::reservations::store::MemoryReservationStore;
    use chrono::{NaiveDate, NaiveTime, Utc};

    fn slot(start_h: u32, end_h: u32) -> TimeSlot {
        TimeSlot::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveTime::from_hms_opt(start_h, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(end_h, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn table(capacity: i32, active: bool) -> BookableResource {
        BookableResource::Table(TableResource {
            id: 5,
            number: 5,
            capacity,
            description: None,
            is_active: active,
        })
    }

    fn game(total_copies: i32) -> BookableResource {
        BookableResource::Game(GameResource {
            id: 1,
            title: "Tekken".to_string(),
            genre: "Fighting".to_string(),
            platform: "PS5".to_string(),
            is_multiplayer: true,
            total_copies,
            max_session_minutes: 60,
            image_url: None,
            is_available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    async fn seed(
        store: &MemoryReservationStore,
        kind: ResourceKind,
        resource_id: i32,
        slot: TimeSlot,
        status: ReservationStatus,
    ) -> i32 {
        let details = match kind {
            ResourceKind::Game => ReservationDetails::Game,
            ResourceKind::Table => ReservationDetails::Table {
                guest_count: 2,
                is_match_event: false,
            },
        };
        store
            .insert(NewReservation {
                user_id: 1,
                resource_kind: kind,
                resource_id,
                slot,
                status,
                notes: None,
                details,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_inactive_resource_is_unavailable() {
        let store = MemoryReservationStore::new();
        let verdict = AvailabilityEngine::check(&store, &table(4, false), &slot(18, 20), None, None)
            .await
            .unwrap();
        assert_eq!(
            verdict,
            Availability::Conflict(ConflictReason::ResourceUnavailable)
        );
    }

    #[tokio::test]
    async fn test_guest_count_over_capacity() {
        let store = MemoryReservationStore::new();
        let verdict =
            AvailabilityEngine::check(&store, &table(2, true), &slot(18, 20), Some(3), None)
                .await
                .unwrap();
        assert_eq!(
            verdict,
            Availability::Conflict(ConflictReason::CapacityExceeded {
                requested: 3,
                capacity: 2
            })
        );
    }

    #[tokio::test]
    async fn test_capacity_check_runs_before_overlap_check() {
        let store = MemoryReservationStore::new();
        seed(
            &store,
            ResourceKind::Table,
            5,
            slot(18, 20),
            ReservationStatus::Booked,
        )
        .await;

        // The overlapping slot would also be a conflict, but the seat
        // bound is reported first.
        let verdict =
            AvailabilityEngine::check(&store, &table(2, true), &slot(18, 20), Some(5), None)
                .await
                .unwrap();
        assert!(matches!(
            verdict,
            Availability::Conflict(ConflictReason::CapacityExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_table_overlap_is_taken() {
        let store = MemoryReservationStore::new();
        seed(
            &store,
            ResourceKind::Table,
            5,
            slot(18, 20),
            ReservationStatus::Booked,
        )
        .await;

        let verdict =
            AvailabilityEngine::check(&store, &table(4, true), &slot(19, 21), Some(2), None)
                .await
                .unwrap();
        assert_eq!(verdict, Availability::Conflict(ConflictReason::TimeSlotTaken));
    }

    #[tokio::test]
    async fn test_table_adjacent_slot_is_available() {
        let store = MemoryReservationStore::new();
        seed(
            &store,
            ResourceKind::Table,
            5,
            slot(18, 20),
            ReservationStatus::Booked,
        )
        .await;

        let verdict =
            AvailabilityEngine::check(&store, &table(4, true), &slot(20, 22), Some(2), None)
                .await
                .unwrap();
        assert_eq!(verdict, Availability::Available);
    }

    #[tokio::test]
    async fn test_cancelled_reservation_frees_table() {
        let store = MemoryReservationStore::new();
        seed(
            &store,
            ResourceKind::Table,
            5,
            slot(18, 20),
            ReservationStatus::Cancelled,
        )
        .await;

        let verdict =
            AvailabilityEngine::check(&store, &table(4, true), &slot(18, 20), Some(2), None)
                .await
                .unwrap();
        assert_eq!(verdict, Availability::Available);
    }

    #[tokio::test]
    async fn test_game_copies_exhausted() {
        let store = MemoryReservationStore::new();
        seed(&store, ResourceKind::Game, 1, slot(10, 11), ReservationStatus::Booked).await;
        seed(&store, ResourceKind::Game, 1, slot(10, 11), ReservationStatus::Booked).await;

        let inner = TimeSlot::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 45, 0).unwrap(),
        )
        .unwrap();
        let verdict = AvailabilityEngine::check(&store, &game(2), &inner, None, None)
            .await
            .unwrap();
        assert_eq!(
            verdict,
            Availability::Conflict(ConflictReason::NoCopiesAvailable)
        );
    }

    #[tokio::test]
    async fn test_game_with_free_copy_is_available() {
        let store = MemoryReservationStore::new();
        seed(&store, ResourceKind::Game, 1, slot(10, 11), ReservationStatus::Booked).await;

        let verdict = AvailabilityEngine::check(&store, &game(2), &slot(10, 11), None, None)
            .await
            .unwrap();
        assert_eq!(verdict, Availability::Available);
    }

    #[tokio::test]
    async fn test_exclude_skips_own_reservation() {
        let store = MemoryReservationStore::new();
        let id = seed(
            &store,
            ResourceKind::Table,
            5,
            slot(18, 20),
            ReservationStatus::Booked,
        )
        .await;

        let verdict =
            AvailabilityEngine::check(&store, &table(4, true), &slot(18, 20), Some(2), Some(id))
                .await
                .unwrap();
        assert_eq!(verdict, Availability::Available);
    }
}
