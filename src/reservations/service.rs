// Reservation lifecycle service
//
// Entry point for creating, updating, deleting and listing reservations.
// Creation is the only path that can introduce a conflict, so it runs
// the availability check and the insert under a per-slot lock; updates
// can only touch status and notes and therefore never re-check
// availability.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};
use validator::Validate;

use crate::catalog::{BookableResource, ResourceCatalog, ResourceKind};
use crate::interval::TimeSlot;
use crate::reservations::availability::{Availability, AvailabilityEngine, ConflictReason};
use crate::reservations::error::{ReservationError, ReservationResult};
use crate::reservations::models::{
    CreateGameReservation, CreateTableReservation, NewReservation, Reservation,
    ReservationDetails, ReservationStatus, ReservationView, UpdateReservation,
};
use crate::reservations::status_machine::StatusMachine;
use crate::reservations::store::ReservationStore;

/// Outcome of a create attempt
///
/// A rejected booking is a normal, recoverable result carrying the
/// conflict reason for the caller to surface; errors are reserved for
/// invalid input, missing resources and infrastructure failures.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(ReservationView),
    Rejected(ConflictReason),
}

impl CreateOutcome {
    pub fn created(self) -> Option<ReservationView> {
        match self {
            CreateOutcome::Created(view) => Some(view),
            CreateOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<ConflictReason> {
        match self {
            CreateOutcome::Created(_) => None,
            CreateOutcome::Rejected(reason) => Some(*reason),
        }
    }
}

/// Key identifying the contention domain of one create attempt
type SlotKey = (ResourceKind, i32, NaiveDate);

/// Per-slot async locks serializing check-then-insert
///
/// The availability check and the subsequent insert are two store calls;
/// without serialization two racing requests could both pass the check
/// and double-book the last copy or the table. One mutex per
/// (kind, resource, date) narrows the critical section to the only
/// requests that can actually conflict. The map only tracks slots with
/// an in-flight create: each acquire sweeps entries nobody holds or
/// waits on, so it never accumulates one key per calendar day.
#[derive(Debug, Default)]
struct SlotLocks {
    inner: Mutex<HashMap<SlotKey, Arc<Mutex<()>>>>,
}

impl SlotLocks {
    async fn acquire(&self, key: SlotKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            // A strong count of 1 means the map holds the only reference:
            // no guard is alive and no task is waiting, so the entry is
            // stale. Sweeping under the outer lock cannot race a clone.
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(map.entry(key).or_default())
        };
        lock.lock_owned().await
    }
}

/// Reservation lifecycle manager
///
/// Generic over the store and catalog so the same logic runs against
/// Postgres in production and the in-memory implementations in tests.
pub struct ReservationService<S, C> {
    store: S,
    catalog: C,
    slot_locks: SlotLocks,
}

impl<S: ReservationStore, C: ResourceCatalog> ReservationService<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self {
            store,
            catalog,
            slot_locks: SlotLocks::default(),
        }
    }

    /// Book a game station session
    pub async fn create_game_reservation(
        &self,
        user_id: i32,
        request: CreateGameReservation,
    ) -> ReservationResult<CreateOutcome> {
        tracing::debug!(
            user_id,
            videogame_id = request.videogame_id,
            "creating game reservation"
        );
        request.validate()?;
        let slot = TimeSlot::new(request.reservation_date, request.start_time, request.end_time)?;

        self.create(
            user_id,
            ResourceKind::Game,
            request.videogame_id,
            slot,
            request.notes,
            ReservationDetails::Game,
            None,
        )
        .await
    }

    /// Book a table for a party
    pub async fn create_table_reservation(
        &self,
        user_id: i32,
        request: CreateTableReservation,
    ) -> ReservationResult<CreateOutcome> {
        tracing::debug!(user_id, table_id = request.table_id, "creating table reservation");
        request.validate()?;
        let slot = TimeSlot::new(request.reservation_date, request.start_time, request.end_time)?;

        self.create(
            user_id,
            ResourceKind::Table,
            request.table_id,
            slot,
            request.notes,
            ReservationDetails::Table {
                guest_count: request.guest_count,
                is_match_event: request.is_match_event,
            },
            Some(request.guest_count),
        )
        .await
    }

    async fn create(
        &self,
        user_id: i32,
        kind: ResourceKind,
        resource_id: i32,
        slot: TimeSlot,
        notes: Option<String>,
        details: ReservationDetails,
        guest_count: Option<i32>,
    ) -> ReservationResult<CreateOutcome> {
        let resource = self
            .catalog
            .find(kind, resource_id)
            .await?
            .ok_or(ReservationError::ResourceNotFound { kind, id: resource_id })?;

        // Serialize check-then-insert per (kind, resource, date) so two
        // racing requests cannot both pass the availability check.
        let _guard = self.slot_locks.acquire((kind, resource_id, slot.date())).await;

        let verdict =
            AvailabilityEngine::check(&self.store, &resource, &slot, guest_count, None).await?;
        if let Availability::Conflict(reason) = verdict {
            tracing::warn!(user_id, %kind, resource_id, %reason, "reservation rejected");
            return Ok(CreateOutcome::Rejected(reason));
        }

        let inserted = self
            .store
            .insert(NewReservation {
                user_id,
                resource_kind: kind,
                resource_id,
                slot,
                status: ReservationStatus::Booked,
                notes,
                details,
            })
            .await;
        let created = match inserted {
            Ok(reservation) => reservation,
            // Another process instance won the slot between our check and
            // insert; the storage-level constraint caught it. Same
            // contract as losing the in-process lock.
            Err(err) if err.is_slot_exclusion() => {
                tracing::warn!(user_id, %kind, resource_id, "reservation rejected by storage");
                return Ok(CreateOutcome::Rejected(ConflictReason::TimeSlotTaken));
            }
            Err(err) => return Err(err),
        };

        tracing::info!(
            reservation_id = created.id,
            user_id,
            %kind,
            resource_id,
            "reservation created"
        );
        Ok(CreateOutcome::Created(
            ReservationView::from_parts(created, Some(&resource)),
        ))
    }

    /// Update a reservation's status and/or notes
    ///
    /// The schedule (resource, date, times) is immutable, so this never
    /// re-runs the availability check. Status changes go through the
    /// state machine; only the owner or an admin may update.
    pub async fn update_reservation(
        &self,
        id: i32,
        patch: UpdateReservation,
        actor_user_id: i32,
        is_admin: bool,
    ) -> ReservationResult<ReservationView> {
        patch.validate()?;
        let existing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ReservationError::NotFound)?;

        if !is_admin && existing.user_id != actor_user_id {
            tracing::warn!(reservation_id = id, actor_user_id, "update denied");
            return Err(ReservationError::PermissionDenied);
        }

        if let Some(to) = patch.status {
            StatusMachine::transition(existing.status, to)
                .map_err(ReservationError::InvalidTransition)?;
        }

        let updated = self.store.update(id, patch.status, patch.notes).await?;
        tracing::info!(reservation_id = id, status = %updated.status, "reservation updated");
        self.view(updated).await
    }

    /// Hard-delete a reservation; returns false when the id is unknown
    ///
    /// Only the owner or an admin may delete.
    pub async fn delete_reservation(
        &self,
        id: i32,
        actor_user_id: i32,
        is_admin: bool,
    ) -> ReservationResult<bool> {
        let existing = match self.store.find_by_id(id).await? {
            Some(reservation) => reservation,
            None => return Ok(false),
        };

        if !is_admin && existing.user_id != actor_user_id {
            tracing::warn!(reservation_id = id, actor_user_id, "delete denied");
            return Err(ReservationError::PermissionDenied);
        }

        let deleted = self.store.delete(id).await?;
        if deleted {
            tracing::info!(reservation_id = id, "reservation deleted");
        }
        Ok(deleted)
    }

    pub async fn get_reservation(&self, id: i32) -> ReservationResult<Option<ReservationView>> {
        match self.store.find_by_id(id).await? {
            Some(reservation) => Ok(Some(self.view(reservation).await?)),
            None => Ok(None),
        }
    }

    pub async fn list_reservations(
        &self,
        kind: ResourceKind,
    ) -> ReservationResult<Vec<ReservationView>> {
        let rows = self.store.list_all(kind).await?;
        self.views(rows).await
    }

    pub async fn list_by_user(&self, user_id: i32) -> ReservationResult<Vec<ReservationView>> {
        let rows = self.store.list_by_user(user_id).await?;
        self.views(rows).await
    }

    pub async fn list_by_resource(
        &self,
        kind: ResourceKind,
        resource_id: i32,
    ) -> ReservationResult<Vec<ReservationView>> {
        let rows = self.store.list_by_resource(kind, resource_id).await?;
        self.views(rows).await
    }

    pub async fn list_active(&self, kind: ResourceKind) -> ReservationResult<Vec<ReservationView>> {
        let rows = self.store.list_active(kind).await?;
        self.views(rows).await
    }

    pub async fn list_by_date(
        &self,
        kind: ResourceKind,
        date: NaiveDate,
    ) -> ReservationResult<Vec<ReservationView>> {
        let rows = self.store.list_by_date(kind, date).await?;
        self.views(rows).await
    }

    /// Active resources of one kind that could accept a booking for the
    /// given slot right now
    ///
    /// Tables qualify with zero overlapping booked reservations; games
    /// qualify while a copy remains free.
    pub async fn list_available_resources(
        &self,
        kind: ResourceKind,
        slot: TimeSlot,
    ) -> ReservationResult<Vec<BookableResource>> {
        let mut available = Vec::new();
        for resource in self.catalog.list_active(kind).await? {
            let verdict =
                AvailabilityEngine::check(&self.store, &resource, &slot, None, None).await?;
            if verdict.is_available() {
                available.push(resource);
            }
        }
        Ok(available)
    }

    /// Whether the catalog may delete a resource
    ///
    /// Deleting a resource with booked reservations would orphan them,
    /// so deletion is forbidden until those are cancelled, completed or
    /// removed.
    pub async fn can_delete_resource(
        &self,
        kind: ResourceKind,
        resource_id: i32,
    ) -> ReservationResult<bool> {
        Ok(!self.store.has_booked_for_resource(kind, resource_id).await?)
    }

    async fn view(&self, reservation: Reservation) -> ReservationResult<ReservationView> {
        let resource = self
            .catalog
            .find(reservation.resource_kind, reservation.resource_id)
            .await?;
        Ok(ReservationView::from_parts(reservation, resource.as_ref()))
    }

    async fn views(&self, rows: Vec<Reservation>) -> ReservationResult<Vec<ReservationView>> {
        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            views.push(self.view(row).await?);
        }
        Ok(views)
    }
}
