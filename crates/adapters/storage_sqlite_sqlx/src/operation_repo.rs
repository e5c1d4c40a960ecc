//! `SQLite` implementation of [`OperationRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use framebot_app::ports::OperationRepository;
use framebot_domain::error::{FramebotError, NotFoundError};
use framebot_domain::id::{OperationId, TaskId};
use framebot_domain::operation::{Operation, OperationKind, OperationParams};

use crate::error::{StorageError, decode};
use crate::store::SqliteJobStore;

struct Wrapper(Operation);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Operation> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let task_id: i64 = row.try_get("task_id")?;
        let name: String = row.try_get("name")?;
        let ignore_error: bool = row.try_get("ignore_error")?;
        let skip: bool = row.try_get("skip")?;
        let kind: String = row.try_get("kind")?;
        let params_json: String = row.try_get("params")?;

        let params: OperationParams = serde_json::from_str(&params_json).map_err(decode)?;

        Ok(Self(Operation {
            id: OperationId::new(id),
            task_id: TaskId::new(task_id),
            name,
            ignore_error,
            skip,
            kind: OperationKind::from(kind),
            params,
        }))
    }
}

impl OperationRepository for SqliteJobStore {
    async fn create_operation(&self, mut operation: Operation) -> Result<Operation, FramebotError> {
        let params_json = serde_json::to_string(&operation.params).map_err(StorageError::from)?;

        let result = sqlx::query(
            "INSERT INTO operations (task_id, name, ignore_error, skip, kind, params) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(operation.task_id.get())
        .bind(&operation.name)
        .bind(operation.ignore_error)
        .bind(operation.skip)
        .bind(operation.kind.as_str())
        .bind(&params_json)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        operation.id = OperationId::new(result.last_insert_rowid());
        Ok(operation)
    }

    async fn get_operation(&self, id: OperationId) -> Result<Option<Operation>, FramebotError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM operations WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn list_operations(&self, task_id: TaskId) -> Result<Vec<Operation>, FramebotError> {
        let rows: Vec<Wrapper> =
            sqlx::query_as("SELECT * FROM operations WHERE task_id = ? ORDER BY id")
                .bind(task_id.get())
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update_operation(&self, operation: Operation) -> Result<Operation, FramebotError> {
        let params_json = serde_json::to_string(&operation.params).map_err(StorageError::from)?;

        let result = sqlx::query(
            "UPDATE operations SET name = ?, ignore_error = ?, skip = ?, kind = ?, params = ? WHERE id = ?",
        )
        .bind(&operation.name)
        .bind(operation.ignore_error)
        .bind(operation.skip)
        .bind(operation.kind.as_str())
        .bind(&params_json)
        .bind(operation.id.get())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "Operation",
                id: operation.id.to_string(),
            }
            .into());
        }
        Ok(operation)
    }

    async fn delete_operation(&self, id: OperationId) -> Result<(), FramebotError> {
        let result = sqlx::query("DELETE FROM operations WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "Operation",
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
