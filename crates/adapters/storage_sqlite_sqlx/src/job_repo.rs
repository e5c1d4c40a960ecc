//! `SQLite` implementation of [`JobRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use framebot_app::ports::JobRepository;
use framebot_domain::error::{FramebotError, NotFoundError};
use framebot_domain::id::{JobId, TaskId};
use framebot_domain::job::Job;

use crate::error::{StorageError, decode};
use crate::store::SqliteJobStore;

struct Wrapper(Job);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Job> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let window_title: String = row.try_get("window_title")?;
        let order_json: String = row.try_get("task_order")?;

        let task_order: Vec<TaskId> = serde_json::from_str(&order_json).map_err(decode)?;

        Ok(Self(Job {
            id: JobId::new(id),
            name,
            window_title,
            task_order,
        }))
    }
}

impl JobRepository for SqliteJobStore {
    async fn create_job(&self, mut job: Job) -> Result<Job, FramebotError> {
        let order_json = serde_json::to_string(&job.task_order).map_err(StorageError::from)?;

        let result =
            sqlx::query("INSERT INTO jobs (name, window_title, task_order) VALUES (?, ?, ?)")
                .bind(&job.name)
                .bind(&job.window_title)
                .bind(&order_json)
                .execute(&self.pool)
                .await
                .map_err(StorageError::from)?;

        job.id = JobId::new(result.last_insert_rowid());
        Ok(job)
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>, FramebotError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM jobs WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn find_job_by_name(&self, name: &str) -> Result<Option<Job>, FramebotError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM jobs WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, FramebotError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM jobs ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update_job(&self, job: Job) -> Result<Job, FramebotError> {
        let order_json = serde_json::to_string(&job.task_order).map_err(StorageError::from)?;

        let result =
            sqlx::query("UPDATE jobs SET name = ?, window_title = ?, task_order = ? WHERE id = ?")
                .bind(&job.name)
                .bind(&job.window_title)
                .bind(&order_json)
                .bind(job.id.get())
                .execute(&self.pool)
                .await
                .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "Job",
                id: job.id.to_string(),
            }
            .into());
        }
        Ok(job)
    }

    async fn delete_job(&self, id: JobId) -> Result<(), FramebotError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "Job",
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
