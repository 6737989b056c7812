//! Storage-specific error type wrapping sqlx errors.

use brewhub_domain::error::BrewhubError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// A stored document is not valid JSON.
    #[error("stored document in {namespace}/{id} is not valid JSON")]
    Json {
        namespace: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for BrewhubError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
