use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::catalog::{BookableResource, ResourceKind};
use crate::interval::TimeSlot;

/// Reservation lifecycle status, shared by game and table bookings
///
/// Only `Booked` reservations count toward conflict and capacity checks;
/// `Completed` and `Cancelled` records persist but release their slot.
/// The legacy per-kind labels ("Active" for games, "Confirmed" for
/// tables) survive as display labels only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Booked,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Booked => "booked",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a status, accepting the legacy per-kind labels
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "booked" | "active" | "confirmed" => Ok(ReservationStatus::Booked),
            "completed" => Ok(ReservationStatus::Completed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            _ => Err(format!("Invalid reservation status: {}", s)),
        }
    }

    /// User-facing label, matching the historical wording per kind
    pub fn display_label(&self, kind: ResourceKind) -> &'static str {
        match (self, kind) {
            (ReservationStatus::Booked, ResourceKind::Game) => "Active",
            (ReservationStatus::Booked, ResourceKind::Table) => "Confirmed",
            (ReservationStatus::Completed, _) => "Completed",
            (ReservationStatus::Cancelled, _) => "Cancelled",
        }
    }

    /// Whether this status holds the slot for conflict purposes
    pub fn is_booked(&self) -> bool {
        matches!(self, ReservationStatus::Booked)
    }
}

impl Default for ReservationStatus {
    fn default() -> Self {
        ReservationStatus::Booked
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Deserialization goes through `from_str` so the legacy labels are
// accepted on every input path, not just explicit parse calls.
impl<'de> Deserialize<'de> for ReservationStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ReservationStatus::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Kind-specific payload carried by a reservation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationDetails {
    Game,
    Table { guest_count: i32, is_match_event: bool },
}

/// Domain model for a stored reservation
///
/// Schedule fields (`resource_kind`, `resource_id`, `slot`) are immutable
/// after creation; updates may only touch status and notes.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub id: i32,
    pub user_id: i32,
    pub resource_kind: ResourceKind,
    pub resource_id: i32,
    pub slot: TimeSlot,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    pub details: ReservationDetails,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn is_booked(&self) -> bool {
        self.status.is_booked()
    }
}

/// Insert payload for the reservation store; id and created_at are
/// assigned by the store
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub user_id: i32,
    pub resource_kind: ResourceKind,
    pub resource_id: i32,
    pub slot: TimeSlot,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    pub details: ReservationDetails,
}

/// Request DTO for booking a game station
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGameReservation {
    pub videogame_id: i32,
    pub reservation_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// Request DTO for booking a table
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTableReservation {
    pub table_id: i32,
    pub reservation_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[validate(range(min = 1, message = "Guest count must be at least 1"))]
    pub guest_count: i32,
    #[serde(default)]
    pub is_match_event: bool,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// Request DTO for updating a reservation
///
/// Only status and notes are editable; date, time and resource are fixed
/// at creation, which is why updates never re-run availability checks.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateReservation {
    pub status: Option<ReservationStatus>,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// Read projection of a reservation joined with resource display fields
#[derive(Debug, Clone, Serialize)]
pub struct ReservationView {
    pub id: i32,
    pub user_id: i32,
    pub resource_kind: ResourceKind,
    pub resource_id: i32,
    pub resource_label: String,
    pub table_capacity: Option<i32>,
    pub reservation_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: ReservationStatus,
    pub status_label: &'static str,
    pub guest_count: Option<i32>,
    pub is_match_event: Option<bool>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReservationView {
    /// Join a reservation with its resource for presentation
    ///
    /// `resource` may be absent when the catalog record was deleted out
    /// from under existing reservations; the view then falls back to a
    /// generic label instead of failing the read.
    pub fn from_parts(reservation: Reservation, resource: Option<&BookableResource>) -> Self {
        let resource_label = resource
            .map(BookableResource::label)
            .unwrap_or_else(|| {
                format!("{} #{}", reservation.resource_kind, reservation.resource_id)
            });
        let table_capacity = resource.and_then(BookableResource::seat_capacity);
        let (guest_count, is_match_event) = match reservation.details {
            ReservationDetails::Game => (None, None),
            ReservationDetails::Table {
                guest_count,
                is_match_event,
            } => (Some(guest_count), Some(is_match_event)),
        };

        Self {
            id: reservation.id,
            user_id: reservation.user_id,
            resource_kind: reservation.resource_kind,
            resource_id: reservation.resource_id,
            resource_label,
            table_capacity,
            reservation_date: reservation.slot.date(),
            start_time: reservation.slot.start(),
            end_time: reservation.slot.end(),
            status: reservation.status,
            status_label: reservation.status.display_label(reservation.resource_kind),
            guest_count,
            is_match_event,
            notes: reservation.notes,
            created_at: reservation.created_at,
        }
    }
}
