use thiserror::Error;

/// Error type for catalog lookups
///
/// The catalog is a read-only collaborator; the only failures it can
/// surface on its own are storage failures. "Resource not found" is an
/// `Option::None`, not an error, so callers decide how a missing id maps
/// into their own error taxonomy.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Database operation errors, automatically converted from sqlx::Error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
