// Resource registry
//
// Read-only access to the bookable catalog. Games and tables are owned
// by the catalog CRUD services; the reservation engine only ever reads
// them, so the trait exposes lookups and nothing else.

use sqlx::PgPool;

use crate::catalog::error::CatalogError;
use crate::catalog::models::{BookableResource, GameResource, ResourceKind, TableResource};

/// Read-only accessor over the persisted games/tables catalog
#[allow(async_fn_in_trait)]
pub trait ResourceCatalog: Send + Sync {
    /// Look up a single resource by kind and id
    async fn find(&self, kind: ResourceKind, id: i32)
        -> Result<Option<BookableResource>, CatalogError>;

    /// All active resources of one kind, in display order
    /// (games by title, tables by table number)
    async fn list_active(&self, kind: ResourceKind) -> Result<Vec<BookableResource>, CatalogError>;
}

/// Catalog backed by the Postgres `videogames` and `venue_tables` tables
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const GAME_COLUMNS: &str = "id, title, genre, platform, is_multiplayer, total_copies, \
     max_session_minutes, image_url, is_available, created_at, updated_at";

const TABLE_COLUMNS: &str = "id, number, capacity, description, is_active";

impl ResourceCatalog for PgCatalog {
    async fn find(
        &self,
        kind: ResourceKind,
        id: i32,
    ) -> Result<Option<BookableResource>, CatalogError> {
        match kind {
            ResourceKind::Game => {
                let game = sqlx::query_as::<_, GameResource>(&format!(
                    "SELECT {GAME_COLUMNS} FROM videogames WHERE id = $1"
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

                Ok(game.map(BookableResource::Game))
            }
            ResourceKind::Table => {
                let table = sqlx::query_as::<_, TableResource>(&format!(
                    "SELECT {TABLE_COLUMNS} FROM venue_tables WHERE id = $1"
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

                Ok(table.map(BookableResource::Table))
            }
        }
    }

    async fn list_active(&self, kind: ResourceKind) -> Result<Vec<BookableResource>, CatalogError> {
        match kind {
            ResourceKind::Game => {
                let games = sqlx::query_as::<_, GameResource>(&format!(
                    "SELECT {GAME_COLUMNS} FROM videogames WHERE is_available ORDER BY title"
                ))
                .fetch_all(&self.pool)
                .await?;

                Ok(games.into_iter().map(BookableResource::Game).collect())
            }
            ResourceKind::Table => {
                let tables = sqlx::query_as::<_, TableResource>(&format!(
                    "SELECT {TABLE_COLUMNS} FROM venue_tables WHERE is_active ORDER BY number"
                ))
                .fetch_all(&self.pool)
                .await?;

                Ok(tables.into_iter().map(BookableResource::Table).collect())
            }
        }
    }
}

/// In-memory catalog for tests and embedded use
///
/// Holds a fixed snapshot of the catalog; lookups clone. The reservation
/// engine never mutates resources, so no interior mutability is needed.
#[derive(Debug, Default, Clone)]
pub struct MemoryCatalog {
    games: Vec<GameResource>,
    tables: Vec<TableResource>,
}

impl MemoryCatalog {
    pub fn new(games: Vec<GameResource>, tables: Vec<TableResource>) -> Self {
        Self { games, tables }
    }
}

impl ResourceCatalog for MemoryCatalog {
    async fn find(
        &self,
        kind: ResourceKind,
        id: i32,
    ) -> Result<Option<BookableResource>, CatalogError> {
        let found = match kind {
            ResourceKind::Game => self
                .games
                .iter()
                .find(|g| g.id == id)
                .cloned()
                .map(BookableResource::Game),
            ResourceKind::Table => self
                .tables
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .map(BookableResource::Table),
        };
        Ok(found)
    }

    async fn list_active(&self, kind: ResourceKind) -> Result<Vec<BookableResource>, CatalogError> {
        match kind {
            ResourceKind::Game => {
                let mut games: Vec<_> =
                    self.games.iter().filter(|g| g.is_available).cloned().collect();
                games.sort_by(|a, b| a.title.cmp(&b.title));
                Ok(games.into_iter().map(BookableResource::Game).collect())
            }
            ResourceKind::Table => {
                let mut tables: Vec<_> =
                    self.tables.iter().filter(|t| t.is_active).cloned().collect();
                tables.sort_by_key(|t| t.number);
                Ok(tables.into_iter().map(BookableResource::Table).collect())
            }
        }
    }
}
