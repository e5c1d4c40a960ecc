//! `SQLite` implementation of [`TaskRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use framebot_app::ports::TaskRepository;
use framebot_domain::error::{FramebotError, NotFoundError};
use framebot_domain::id::{JobId, OperationId, TaskId};
use framebot_domain::task::Task;

use crate::error::{StorageError, decode};
use crate::store::SqliteJobStore;

struct Wrapper(Task);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Task> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let job_id: i64 = row.try_get("job_id")?;
        let name: String = row.try_get("name")?;
        let ignore_error: bool = row.try_get("ignore_error")?;
        let skip: bool = row.try_get("skip")?;
        let order_json: String = row.try_get("operation_order")?;

        let operation_order: Vec<OperationId> =
            serde_json::from_str(&order_json).map_err(decode)?;

        Ok(Self(Task {
            id: TaskId::new(id),
            job_id: JobId::new(job_id),
            name,
            ignore_error,
            skip,
            operation_order,
        }))
    }
}

impl TaskRepository for SqliteJobStore {
    async fn create_task(&self, mut task: Task) -> Result<Task, FramebotError> {
        let order_json =
            serde_json::to_string(&task.operation_order).map_err(StorageError::from)?;

        let result = sqlx::query(
            "INSERT INTO tasks (job_id, name, ignore_error, skip, operation_order) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(task.job_id.get())
        .bind(&task.name)
        .bind(task.ignore_error)
        .bind(task.skip)
        .bind(&order_json)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        task.id = TaskId::new(result.last_insert_rowid());
        Ok(task)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, FramebotError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn list_tasks(&self, job_id: JobId) -> Result<Vec<Task>, FramebotError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM tasks WHERE job_id = ? ORDER BY id")
            .bind(job_id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update_task(&self, task: Task) -> Result<Task, FramebotError> {
        let order_json =
            serde_json::to_string(&task.operation_order).map_err(StorageError::from)?;

        let result = sqlx::query(
            "UPDATE tasks SET name = ?, ignore_error = ?, skip = ?, operation_order = ? WHERE id = ?",
        )
        .bind(&task.name)
        .bind(task.ignore_error)
        .bind(task.skip)
        .bind(&order_json)
        .bind(task.id.get())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "Task",
                id: task.id.to_string(),
            }
            .into());
        }
        Ok(task)
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), FramebotError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "Task",
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
