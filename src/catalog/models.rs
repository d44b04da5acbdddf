use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The two kinds of bookable resource the venue offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Game,
    Table,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Game => "game",
            ResourceKind::Table => "table",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How many concurrent bookings a resource admits over one time window
///
/// Tables are exclusive: one party per overlapping window, whatever the
/// seat count. Games are fungible copies: up to `total_copies` parties
/// may hold overlapping sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityModel {
    SingleUnit,
    MultiUnit(i32),
}

/// A video game title in the station catalog
///
/// Availability over a time window is always computed from active
/// reservations; there is deliberately no stored free-copy counter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GameResource {
    pub id: i32,
    pub title: String,
    pub genre: String,
    pub platform: String,
    pub is_multiplayer: bool,
    pub total_copies: i32,
    pub max_session_minutes: i32,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A dining table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TableResource {
    pub id: i32,
    pub number: i32,
    pub capacity: i32,
    pub description: Option<String>,
    pub is_active: bool,
}

/// A resource the reservation engine can book, polymorphic over kind
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BookableResource {
    Game(GameResource),
    Table(TableResource),
}

impl BookableResource {
    pub fn id(&self) -> i32 {
        match self {
            BookableResource::Game(g) => g.id,
            BookableResource::Table(t) => t.id,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            BookableResource::Game(_) => ResourceKind::Game,
            BookableResource::Table(_) => ResourceKind::Table,
        }
    }

    /// Inactive resources are never bookable and never listed as available
    pub fn is_active(&self) -> bool {
        match self {
            BookableResource::Game(g) => g.is_available,
            BookableResource::Table(t) => t.is_active,
        }
    }

    pub fn capacity_model(&self) -> CapacityModel {
        match self {
            BookableResource::Game(g) => CapacityModel::MultiUnit(g.total_copies),
            BookableResource::Table(_) => CapacityModel::SingleUnit,
        }
    }

    /// Display name used in reservation views
    pub fn label(&self) -> String {
        match self {
            BookableResource::Game(g) => g.title.clone(),
            BookableResource::Table(t) => format!("Table {}", t.number),
        }
    }

    /// Seat count for tables; games have no per-booking party bound
    pub fn seat_capacity(&self) -> Option<i32> {
        match self {
            BookableResource::Game(_) => None,
            BookableResource::Table(t) => Some(t.capacity),
        }
    }
}
