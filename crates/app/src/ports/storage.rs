//! Storage ports: repository traits for the job hierarchy.
//!
//! Children are always listed in natural (creation) order; the ordered
//! accessors apply the parent's explicit order list on top of that.

use std::future::Future;

use framebot_domain::error::FramebotError;
use framebot_domain::id::{JobId, OperationId, TaskId};
use framebot_domain::job::Job;
use framebot_domain::operation::Operation;
use framebot_domain::ordering::resolve_order;
use framebot_domain::task::Task;

/// Repository for persisting and querying [`Job`]s.
pub trait JobRepository: Send + Sync {
    /// Create a new job, returning it with its storage-assigned id.
    fn create_job(&self, job: Job) -> impl Future<Output = Result<Job, FramebotError>> + Send;

    /// Get a job by id.
    fn get_job(&self, id: JobId)
    -> impl Future<Output = Result<Option<Job>, FramebotError>> + Send;

    /// Get a job by its unique name.
    fn find_job_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Job>, FramebotError>> + Send;

    /// Get all jobs in creation order.
    fn list_jobs(&self) -> impl Future<Output = Result<Vec<Job>, FramebotError>> + Send;

    /// Update an existing job.
    fn update_job(&self, job: Job) -> impl Future<Output = Result<Job, FramebotError>> + Send;

    /// Delete a job together with its tasks and their operations.
    ///
    /// Returns [`FramebotError::NotFound`] when no job has that id.
    fn delete_job(&self, id: JobId) -> impl Future<Output = Result<(), FramebotError>> + Send;
}

/// Repository for persisting and querying [`Task`]s.
pub trait TaskRepository: Send + Sync {
    fn create_task(&self, task: Task) -> impl Future<Output = Result<Task, FramebotError>> + Send;

    fn get_task(&self, id: TaskId)
    -> impl Future<Output = Result<Option<Task>, FramebotError>> + Send;

    /// Tasks owned by `job_id`, in creation order.
    fn list_tasks(
        &self,
        job_id: JobId,
    ) -> impl Future<Output = Result<Vec<Task>, FramebotError>> + Send;

    fn update_task(&self, task: Task) -> impl Future<Output = Result<Task, FramebotError>> + Send;

    /// Delete a task together with its operations.
    ///
    /// Returns [`FramebotError::NotFound`] when no task has that id.
    fn delete_task(&self, id: TaskId) -> impl Future<Output = Result<(), FramebotError>> + Send;

    /// Tasks of `job` in execution order.
    fn ordered_tasks(
        &self,
        job: &Job,
    ) -> impl Future<Output = Result<Vec<Task>, FramebotError>> + Send {
        async move {
            let tasks = self.list_tasks(job.id).await?;
            Ok(resolve_order(tasks, &job.task_order))
        }
    }
}

/// Repository for persisting and querying [`Operation`]s.
pub trait OperationRepository: Send + Sync {
    fn create_operation(
        &self,
        operation: Operation,
    ) -> impl Future<Output = Result<Operation, FramebotError>> + Send;

    fn get_operation(
        &self,
        id: OperationId,
    ) -> impl Future<Output = Result<Option<Operation>, FramebotError>> + Send;

    /// Operations owned by `task_id`, in creation order.
    fn list_operations(
        &self,
        task_id: TaskId,
    ) -> impl Future<Output = Result<Vec<Operation>, FramebotError>> + Send;

    fn update_operation(
        &self,
        operation: Operation,
    ) -> impl Future<Output = Result<Operation, FramebotError>> + Send;

    fn delete_operation(
        &self,
        id: OperationId,
    ) -> impl Future<Output = Result<(), FramebotError>> + Send;

    /// Operations of `task` in execution order.
    fn ordered_operations(
        &self,
        task: &Task,
    ) -> impl Future<Output = Result<Vec<Operation>, FramebotError>> + Send {
        async move {
            let operations = self.list_operations(task.id).await?;
            Ok(resolve_order(operations, &task.operation_order))
        }
    }
}
