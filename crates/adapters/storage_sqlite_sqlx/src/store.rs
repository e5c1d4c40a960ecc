//! The `SQLite`-backed job store.
//!
//! One store implements all three repository ports over a shared pool.
//! Order lists and operation parameters are stored as JSON text columns.

use sqlx::SqlitePool;

/// `SQLite`-backed repository for jobs, tasks and operations.
#[derive(Debug, Clone)]
pub struct SqliteJobStore {
    pub(crate) pool: SqlitePool,
}

impl SqliteJobStore {
    /// Create a new store backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[cfg(test)]
pub(crate) async fn setup() -> SqliteJobStore {
    crate::pool::Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .unwrap()
    .job_store()
}
