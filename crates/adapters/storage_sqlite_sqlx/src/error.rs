//! Storage-specific error type wrapping sqlx errors.

use scenario_domain::error::ScenarioError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to serialize or deserialize a stored scenario document.
    #[error("JSON serialization error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A revision or position does not fit the column type.
    #[error("integer out of range")]
    OutOfRange(#[from] std::num::TryFromIntError),
}

impl From<StorageError> for ScenarioError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
