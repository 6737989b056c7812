//! `SQLite` implementation of [`StateStore`].

use std::future::Future;

use sqlx::SqlitePool;

use brewhub_app::ports::StateStore;
use brewhub_domain::error::BrewhubError;

use crate::error::StorageError;

const SELECT: &str = "SELECT value FROM datastore WHERE namespace = ? AND id = ?";
const UPSERT: &str = "INSERT INTO datastore (namespace, id, value, updated_at) VALUES (?, ?, ?, ?) \
     ON CONFLICT (namespace, id) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";

/// `SQLite`-backed key/value document store.
#[derive(Clone)]
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl StateStore for SqliteStateStore {
    fn get(
        &self,
        namespace: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, BrewhubError>> + Send {
        let pool = self.pool.clone();
        let namespace = namespace.to_string();
        let id = id.to_string();
        async move {
            let row: Option<(String,)> = sqlx::query_as(SELECT)
                .bind(&namespace)
                .bind(&id)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            let Some((raw,)) = row else {
                return Ok(None);
            };
            let value = serde_json::from_str(&raw)
                .map_err(|source| StorageError::Json { namespace, id, source })?;
            Ok(Some(value))
        }
    }

    fn set(
        &self,
        namespace: &str,
        id: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<(), BrewhubError>> + Send {
        let pool = self.pool.clone();
        let namespace = namespace.to_string();
        let id = id.to_string();
        async move {
            sqlx::query(UPSERT)
                .bind(&namespace)
                .bind(&id)
                .bind(value.to_string())
                .bind(chrono::Utc::now().to_rfc3339())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            tracing::trace!(%namespace, %id, "document stored");
            Ok(())
        }
    }
}
