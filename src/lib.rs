// Reservation and availability core for a game-bar venue
//
// Guests book either a game station (a title with a finite number of
// copies) or a dining table (exclusive per time window). This crate
// owns the time-slot model, the catalog read side, the reservation
// store and the availability/lifecycle logic; HTTP routing, auth and
// catalog CRUD live in the surrounding application.

pub mod catalog;
pub mod db;
pub mod interval;
pub mod reservations;

pub use catalog::{
    BookableResource, CapacityModel, CatalogError, GameResource, MemoryCatalog, PgCatalog,
    ResourceCatalog, ResourceKind, TableResource,
};
pub use interval::{InvalidInterval, TimeSlot};
pub use reservations::{
    Availability, AvailabilityEngine, ConflictReason, CreateGameReservation,
    CreateTableReservation, CreateOutcome, MemoryReservationStore, NewReservation,
    PgReservationStore, Reservation, ReservationDetails, ReservationError, ReservationResult,
    ReservationService, ReservationStatus, ReservationStore, ReservationView, StatusMachine,
    UpdateReservation,
};
