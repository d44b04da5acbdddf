// Reservation store
//
// Durable collection of reservation records for both resource kinds,
// keyed by resource and date, queryable by overlap. The Postgres store
// is the production backend; the in-memory store backs tests and
// embedded use.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;

use crate::catalog::ResourceKind;
use crate::interval::TimeSlot;
use crate::reservations::error::{ReservationError, ReservationResult};
use crate::reservations::models::{
    NewReservation, Reservation, ReservationDetails, ReservationStatus,
};

/// Persistence interface for reservation records
///
/// Overlap queries only ever return booked-status rows; completed and
/// cancelled records persist but no longer hold their slot. List reads
/// order by date descending then start time ascending (newest day
/// first, chronological within a day), except `list_by_date` which is
/// purely chronological.
#[allow(async_fn_in_trait)]
pub trait ReservationStore: Send + Sync {
    /// Persist a new reservation, assigning a monotonically increasing
    /// id and the creation timestamp
    async fn insert(&self, new: NewReservation) -> ReservationResult<Reservation>;

    async fn find_by_id(&self, id: i32) -> ReservationResult<Option<Reservation>>;

    /// Booked-status reservations for a resource whose slot overlaps the
    /// given one, ordered by start time; `exclude` drops one id from the
    /// result
    async fn find_overlapping(
        &self,
        kind: ResourceKind,
        resource_id: i32,
        slot: &TimeSlot,
        exclude: Option<i32>,
    ) -> ReservationResult<Vec<Reservation>>;

    /// Patch status and/or notes; schedule fields are not patchable
    async fn update(
        &self,
        id: i32,
        status: Option<ReservationStatus>,
        notes: Option<String>,
    ) -> ReservationResult<Reservation>;

    /// Hard delete; returns false when the id does not exist
    async fn delete(&self, id: i32) -> ReservationResult<bool>;

    async fn list_all(&self, kind: ResourceKind) -> ReservationResult<Vec<Reservation>>;

    /// Reservations of both kinds owned by one user
    async fn list_by_user(&self, user_id: i32) -> ReservationResult<Vec<Reservation>>;

    async fn list_by_resource(
        &self,
        kind: ResourceKind,
        resource_id: i32,
    ) -> ReservationResult<Vec<Reservation>>;

    async fn list_active(&self, kind: ResourceKind) -> ReservationResult<Vec<Reservation>>;

    async fn list_by_date(
        &self,
        kind: ResourceKind,
        date: NaiveDate,
    ) -> ReservationResult<Vec<Reservation>>;

    /// Whether any booked-status reservation references the resource;
    /// used to guard catalog deletions
    async fn has_booked_for_resource(
        &self,
        kind: ResourceKind,
        resource_id: i32,
    ) -> ReservationResult<bool>;
}

/// Flat row shape of the `reservations` table
#[derive(Debug, FromRow)]
struct ReservationRow {
    id: i32,
    user_id: i32,
    resource_kind: ResourceKind,
    resource_id: i32,
    reservation_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    status: ReservationStatus,
    notes: Option<String>,
    guest_count: Option<i32>,
    is_match_event: Option<bool>,
    created_at: DateTime<Utc>,
}

impl ReservationRow {
    fn into_reservation(self) -> ReservationResult<Reservation> {
        // Stored rows satisfy the slot invariant; a violation here means
        // the table was tampered with outside the application.
        let slot = TimeSlot::new(self.reservation_date, self.start_time, self.end_time)?;
        let details = match self.resource_kind {
            ResourceKind::Game => ReservationDetails::Game,
            ResourceKind::Table => ReservationDetails::Table {
                guest_count: self.guest_count.unwrap_or(1),
                is_match_event: self.is_match_event.unwrap_or(false),
            },
        };
        Ok(Reservation {
            id: self.id,
            user_id: self.user_id,
            resource_kind: self.resource_kind,
            resource_id: self.resource_id,
            slot,
            status: self.status,
            notes: self.notes,
            details,
            created_at: self.created_at,
        })
    }
}

fn rows_into_reservations(rows: Vec<ReservationRow>) -> ReservationResult<Vec<Reservation>> {
    rows.into_iter().map(ReservationRow::into_reservation).collect()
}

const RESERVATION_COLUMNS: &str = "id, user_id, resource_kind, resource_id, reservation_date, \
     start_time, end_time, status, notes, guest_count, is_match_event, created_at";

/// Reservation store backed by the Postgres `reservations` table
#[derive(Clone)]
pub struct PgReservationStore {
    pool: PgPool,
}

impl PgReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ReservationStore for PgReservationStore {
    async fn insert(&self, new: NewReservation) -> ReservationResult<Reservation> {
        let (guest_count, is_match_event) = match new.details {
            ReservationDetails::Game => (None, None),
            ReservationDetails::Table {
                guest_count,
                is_match_event,
            } => (Some(guest_count), Some(is_match_event)),
        };

        let row = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            INSERT INTO reservations
                (user_id, resource_kind, resource_id, reservation_date,
                 start_time, end_time, status, notes, guest_count, is_match_event)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.resource_kind)
        .bind(new.resource_id)
        .bind(new.slot.date())
        .bind(new.slot.start())
        .bind(new.slot.end())
        .bind(new.status)
        .bind(new.notes)
        .bind(guest_count)
        .bind(is_match_event)
        .fetch_one(&self.pool)
        .await?;

        row.into_reservation()
    }

    async fn find_by_id(&self, id: i32) -> ReservationResult<Option<Reservation>> {
        let row = sqlx::query_as::<_, ReservationRow>(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ReservationRow::into_reservation).transpose()
    }

    async fn find_overlapping(
        &self,
        kind: ResourceKind,
        resource_id: i32,
        slot: &TimeSlot,
        exclude: Option<i32>,
    ) -> ReservationResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE resource_kind = $1
              AND resource_id = $2
              AND reservation_date = $3
              AND status = 'booked'
              AND start_time < $5
              AND $4 < end_time
              AND ($6::int4 IS NULL OR id <> $6)
            ORDER BY start_time
            "#
        ))
        .bind(kind)
        .bind(resource_id)
        .bind(slot.date())
        .bind(slot.start())
        .bind(slot.end())
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;

        rows_into_reservations(rows)
    }

    async fn update(
        &self,
        id: i32,
        status: Option<ReservationStatus>,
        notes: Option<String>,
    ) -> ReservationResult<Reservation> {
        let row = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            UPDATE reservations
            SET status = COALESCE($1, status),
                notes = COALESCE($2, notes)
            WHERE id = $3
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(status)
        .bind(notes)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ReservationError::NotFound)?;

        row.into_reservation()
    }

    async fn delete(&self, id: i32) -> ReservationResult<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self, kind: ResourceKind) -> ReservationResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE resource_kind = $1
            ORDER BY reservation_date DESC, start_time
            "#
        ))
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        rows_into_reservations(rows)
    }

    async fn list_by_user(&self, user_id: i32) -> ReservationResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE user_id = $1
            ORDER BY reservation_date DESC, start_time
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows_into_reservations(rows)
    }

    async fn list_by_resource(
        &self,
        kind: ResourceKind,
        resource_id: i32,
    ) -> ReservationResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE resource_kind = $1 AND resource_id = $2
            ORDER BY reservation_date DESC, start_time
            "#
        ))
        .bind(kind)
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await?;

        rows_into_reservations(rows)
    }

    async fn list_active(&self, kind: ResourceKind) -> ReservationResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE resource_kind = $1 AND status = 'booked'
            ORDER BY reservation_date, start_time
            "#
        ))
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        rows_into_reservations(rows)
    }

    async fn list_by_date(
        &self,
        kind: ResourceKind,
        date: NaiveDate,
    ) -> ReservationResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE resource_kind = $1 AND reservation_date = $2
            ORDER BY start_time
            "#
        ))
        .bind(kind)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        rows_into_reservations(rows)
    }

    async fn has_booked_for_resource(
        &self,
        kind: ResourceKind,
        resource_id: i32,
    ) -> ReservationResult<bool> {
        let exists: Option<bool> = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservations \
             WHERE resource_kind = $1 AND resource_id = $2 AND status = 'booked')",
        )
        .bind(kind)
        .bind(resource_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.unwrap_or(false))
    }
}

/// In-memory reservation store
///
/// Single `RwLock` over the record vector; id assignment shares the
/// write lock so ids are strictly increasing.
#[derive(Debug, Default)]
pub struct MemoryReservationStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    rows: Vec<Reservation>,
    next_id: i32,
}

impl MemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_newest_day_first(rows: &mut [Reservation]) {
    rows.sort_by(|a, b| {
        b.slot
            .date()
            .cmp(&a.slot.date())
            .then(a.slot.start().cmp(&b.slot.start()))
    });
}

impl ReservationStore for MemoryReservationStore {
    async fn insert(&self, new: NewReservation) -> ReservationResult<Reservation> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let reservation = Reservation {
            id: inner.next_id,
            user_id: new.user_id,
            resource_kind: new.resource_kind,
            resource_id: new.resource_id,
            slot: new.slot,
            status: new.status,
            notes: new.notes,
            details: new.details,
            created_at: Utc::now(),
        };
        inner.rows.push(reservation.clone());
        Ok(reservation)
    }

    async fn find_by_id(&self, id: i32) -> ReservationResult<Option<Reservation>> {
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn find_overlapping(
        &self,
        kind: ResourceKind,
        resource_id: i32,
        slot: &TimeSlot,
        exclude: Option<i32>,
    ) -> ReservationResult<Vec<Reservation>> {
        let inner = self.inner.read().await;
        let mut hits: Vec<Reservation> = inner
            .rows
            .iter()
            .filter(|r| {
                r.resource_kind == kind
                    && r.resource_id == resource_id
                    && r.is_booked()
                    && r.slot.overlaps(slot)
                    && exclude != Some(r.id)
            })
            .cloned()
            .collect();
        hits.sort_by_key(|r| r.slot.start());
        Ok(hits)
    }

    async fn update(
        &self,
        id: i32,
        status: Option<ReservationStatus>,
        notes: Option<String>,
    ) -> ReservationResult<Reservation> {
        let mut inner = self.inner.write().await;
        let row = inner
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ReservationError::NotFound)?;
        if let Some(status) = status {
            row.status = status;
        }
        if let Some(notes) = notes {
            row.notes = Some(notes);
        }
        Ok(row.clone())
    }

    async fn delete(&self, id: i32) -> ReservationResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.rows.len();
        inner.rows.retain(|r| r.id != id);
        Ok(inner.rows.len() < before)
    }

    async fn list_all(&self, kind: ResourceKind) -> ReservationResult<Vec<Reservation>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Reservation> = inner
            .rows
            .iter()
            .filter(|r| r.resource_kind == kind)
            .cloned()
            .collect();
        sort_newest_day_first(&mut rows);
        Ok(rows)
    }

    async fn list_by_user(&self, user_id: i32) -> ReservationResult<Vec<Reservation>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Reservation> = inner
            .rows
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        sort_newest_day_first(&mut rows);
        Ok(rows)
    }

    async fn list_by_resource(
        &self,
        kind: ResourceKind,
        resource_id: i32,
    ) -> ReservationResult<Vec<Reservation>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Reservation> = inner
            .rows
            .iter()
            .filter(|r| r.resource_kind == kind && r.resource_id == resource_id)
            .cloned()
            .collect();
        sort_newest_day_first(&mut rows);
        Ok(rows)
    }

    async fn list_active(&self, kind: ResourceKind) -> ReservationResult<Vec<Reservation>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Reservation> = inner
            .rows
            .iter()
            .filter(|r| r.resource_kind == kind && r.is_booked())
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.slot.date(), r.slot.start()));
        Ok(rows)
    }

    async fn list_by_date(
        &self,
        kind: ResourceKind,
        date: NaiveDate,
    ) -> ReservationResult<Vec<Reservation>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Reservation> = inner
            .rows
            .iter()
            .filter(|r| r.resource_kind == kind && r.slot.date() == date)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.slot.start());
        Ok(rows)
    }

    async fn has_booked_for_resource(
        &self,
        kind: ResourceKind,
        resource_id: i32,
    ) -> ReservationResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .any(|r| r.resource_kind == kind && r.resource_id == resource_id && r.is_booked()))
    }
}
