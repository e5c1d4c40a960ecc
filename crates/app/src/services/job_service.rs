//! Job service: authoring use-cases for jobs, tasks and operations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use framebot_domain::error::{FramebotError, NotFoundError, ValidationError};
use framebot_domain::id::{JobId, OperationId, TaskId};
use framebot_domain::job::Job;
use framebot_domain::operation::Operation;
use framebot_domain::task::Task;

use crate::ports::{JobRepository, OperationRepository, TaskRepository};

/// A job with its whole tree, as exchanged by export and import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobBundle {
    #[serde(flatten)]
    pub job: Job,
    #[serde(default)]
    pub tasks: Vec<TaskBundle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskBundle {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// Application service for editing the job tree.
pub struct JobService<R> {
    repo: R,
}

impl<R> JobService<R>
where
    R: JobRepository + TaskRepository + OperationRepository,
{
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    // ── jobs ───────────────────────────────────────────────────

    /// Create a job after validating domain invariants.
    ///
    /// A new job has no tasks, so its task order must be empty.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::Validation`] if invariants fail or the name
    /// is taken, or a storage error from the repository.
    #[tracing::instrument(skip(self, job), fields(job_name = %job.name))]
    pub async fn create_job(&self, job: Job) -> Result<Job, FramebotError> {
        job.validate()?;
        check_order("job", job.task_order.iter().map(|id| id.get()), &[])?;
        if self.repo.find_job_by_name(&job.name).await?.is_some() {
            return Err(ValidationError::DuplicateName(job.name).into());
        }
        self.repo.create_job(job).await
    }

    /// Look up a job by id.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] when no job with `id` exists, or
    /// a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_job(&self, id: JobId) -> Result<Job, FramebotError> {
        self.repo
            .get_job(id)
            .await?
            .ok_or_else(|| not_found("Job", id))
    }

    /// Look up a job by name.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] when no job is called `name`, or
    /// a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn find_job(&self, name: &str) -> Result<Job, FramebotError> {
        self.repo
            .find_job_by_name(name)
            .await?
            .ok_or_else(|| not_found("Job", name))
    }

    /// List all jobs in creation order.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_jobs(&self) -> Result<Vec<Job>, FramebotError> {
        self.repo.list_jobs().await
    }

    /// Update an existing job.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::Validation`] if invariants fail, the name is
    /// taken by another job or the task order names a task the job does not
    /// own; [`FramebotError::NotFound`] if the job does not exist.
    #[tracing::instrument(skip(self, job), fields(job_id = %job.id))]
    pub async fn update_job(&self, job: Job) -> Result<Job, FramebotError> {
        job.validate()?;
        self.get_job(job.id).await?;
        if let Some(other) = self.repo.find_job_by_name(&job.name).await?
            && other.id != job.id
        {
            return Err(ValidationError::DuplicateName(job.name).into());
        }
        let children = self.task_ids(job.id).await?;
        check_order("job", job.task_order.iter().map(|id| id.get()), &children)?;
        self.repo.update_job(job).await
    }

    /// Delete a job together with its tasks and operations.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] for an unknown job.
    #[tracing::instrument(skip(self))]
    pub async fn delete_job(&self, id: JobId) -> Result<(), FramebotError> {
        self.repo.delete_job(id).await
    }

    /// Replace the explicit task order of a job.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownChild`] if `order` names a task the
    /// job does not own, or [`FramebotError::NotFound`] for an unknown job.
    #[tracing::instrument(skip(self))]
    pub async fn set_task_order(&self, job_id: JobId, order: Vec<TaskId>) -> Result<Job, FramebotError> {
        let mut job = self.get_job(job_id).await?;
        job.task_order = order;
        self.update_job(job).await
    }

    // ── tasks ──────────────────────────────────────────────────

    /// Add a task to `job_id`.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] for an unknown job, or
    /// [`FramebotError::Validation`] if invariants fail.
    #[tracing::instrument(skip(self, task), fields(task_name = %task.name))]
    pub async fn add_task(&self, job_id: JobId, mut task: Task) -> Result<Task, FramebotError> {
        self.get_job(job_id).await?;
        task.job_id = job_id;
        task.validate()?;
        check_order("task", task.operation_order.iter().map(|id| id.get()), &[])?;
        self.repo.create_task(task).await
    }

    /// Look up a task by id.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] when no task with `id` exists.
    pub async fn get_task(&self, id: TaskId) -> Result<Task, FramebotError> {
        self.repo
            .get_task(id)
            .await?
            .ok_or_else(|| not_found("Task", id))
    }

    /// Tasks of `job_id` in execution order.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] for an unknown job.
    pub async fn ordered_tasks(&self, job_id: JobId) -> Result<Vec<Task>, FramebotError> {
        let job = self.get_job(job_id).await?;
        self.repo.ordered_tasks(&job).await
    }

    /// Update an existing task. A task cannot move to another job.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::Validation`] if invariants fail or the
    /// operation order names an operation the task does not own.
    #[tracing::instrument(skip(self, task), fields(task_id = %task.id))]
    pub async fn update_task(&self, mut task: Task) -> Result<Task, FramebotError> {
        task.validate()?;
        let existing = self.get_task(task.id).await?;
        task.job_id = existing.job_id;
        let children = self.operation_ids(task.id).await?;
        check_order("task", task.operation_order.iter().map(|id| id.get()), &children)?;
        self.repo.update_task(task).await
    }

    /// Delete a task and its operations, dropping it from the job's order.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] for an unknown task.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: TaskId) -> Result<(), FramebotError> {
        let task = self.get_task(id).await?;
        self.repo.delete_task(id).await?;
        if let Some(mut job) = self.repo.get_job(task.job_id).await?
            && job.task_order.contains(&id)
        {
            job.task_order.retain(|t| *t != id);
            self.repo.update_job(job).await?;
        }
        Ok(())
    }

    /// Toggle whether runs pass over a task.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] for an unknown task.
    #[tracing::instrument(skip(self))]
    pub async fn set_task_skip(&self, id: TaskId, skip: bool) -> Result<Task, FramebotError> {
        let mut task = self.get_task(id).await?;
        task.skip = skip;
        self.repo.update_task(task).await
    }

    /// Replace the explicit operation order of a task.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownChild`] if `order` names an
    /// operation the task does not own.
    #[tracing::instrument(skip(self))]
    pub async fn set_operation_order(
        &self,
        task_id: TaskId,
        order: Vec<OperationId>,
    ) -> Result<Task, FramebotError> {
        let mut task = self.get_task(task_id).await?;
        task.operation_order = order;
        self.update_task(task).await
    }

    // ── operations ─────────────────────────────────────────────

    /// Add an operation to `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] for an unknown task, or
    /// [`FramebotError::Validation`] if the operation is not executable.
    #[tracing::instrument(skip(self, operation), fields(operation_name = %operation.name))]
    pub async fn add_operation(
        &self,
        task_id: TaskId,
        mut operation: Operation,
    ) -> Result<Operation, FramebotError> {
        self.get_task(task_id).await?;
        operation.task_id = task_id;
        operation.validate()?;
        self.repo.create_operation(operation).await
    }

    /// Look up an operation by id.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] when no operation with `id` exists.
    pub async fn get_operation(&self, id: OperationId) -> Result<Operation, FramebotError> {
        self.repo
            .get_operation(id)
            .await?
            .ok_or_else(|| not_found("Operation", id))
    }

    /// Operations of `task_id` in execution order.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] for an unknown task.
    pub async fn ordered_operations(&self, task_id: TaskId) -> Result<Vec<Operation>, FramebotError> {
        let task = self.get_task(task_id).await?;
        self.repo.ordered_operations(&task).await
    }

    /// Update an existing operation. An operation cannot move to another task.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::Validation`] if the operation is not
    /// executable, or [`FramebotError::NotFound`] if it does not exist.
    #[tracing::instrument(skip(self, operation), fields(operation_id = %operation.id))]
    pub async fn update_operation(&self, mut operation: Operation) -> Result<Operation, FramebotError> {
        operation.validate()?;
        let existing = self.get_operation(operation.id).await?;
        operation.task_id = existing.task_id;
        self.repo.update_operation(operation).await
    }

    /// Delete an operation, dropping it from the task's order.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] for an unknown operation.
    #[tracing::instrument(skip(self))]
    pub async fn delete_operation(&self, id: OperationId) -> Result<(), FramebotError> {
        let operation = self.get_operation(id).await?;
        self.repo.delete_operation(id).await?;
        if let Some(mut task) = self.repo.get_task(operation.task_id).await?
            && task.operation_order.contains(&id)
        {
            task.operation_order.retain(|o| *o != id);
            self.repo.update_task(task).await?;
        }
        Ok(())
    }

    /// Toggle whether runs pass over an operation.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] for an unknown operation.
    #[tracing::instrument(skip(self))]
    pub async fn set_operation_skip(
        &self,
        id: OperationId,
        skip: bool,
    ) -> Result<Operation, FramebotError> {
        let mut operation = self.get_operation(id).await?;
        operation.skip = skip;
        self.repo.update_operation(operation).await
    }

    // ── exchange ───────────────────────────────────────────────

    /// Dump every job with its tasks and operations in creation order.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn export_jobs(&self) -> Result<Vec<JobBundle>, FramebotError> {
        let mut bundles = Vec::new();
        for job in self.repo.list_jobs().await? {
            let mut tasks = Vec::new();
            for task in self.repo.list_tasks(job.id).await? {
                let operations = self.repo.list_operations(task.id).await?;
                tasks.push(TaskBundle { task, operations });
            }
            bundles.push(JobBundle { job, tasks });
        }
        Ok(bundles)
    }

    /// Recreate exported jobs under fresh ids.
    ///
    /// Order lists are rewritten to the new ids; entries that referred to
    /// no exported child are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::Validation`] when a record is invalid or a
    /// job name is already taken. Jobs imported before the failing one stay.
    #[tracing::instrument(skip(self, bundles), fields(jobs = bundles.len()))]
    pub async fn import_jobs(&self, bundles: Vec<JobBundle>) -> Result<Vec<Job>, FramebotError> {
        let mut imported = Vec::with_capacity(bundles.len());
        for bundle in bundles {
            imported.push(self.import_job(bundle).await?);
        }
        Ok(imported)
    }

    async fn import_job(&self, bundle: JobBundle) -> Result<Job, FramebotError> {
        let JobBundle { job, tasks } = bundle;
        let task_order = job.task_order.clone();
        let mut created = self
            .create_job(Job {
                id: JobId::UNSAVED,
                task_order: Vec::new(),
                ..job
            })
            .await?;

        let mut task_ids = HashMap::new();
        for TaskBundle { task, operations } in tasks {
            let old_task_id = task.id;
            let operation_order = task.operation_order.clone();
            let mut new_task = self
                .add_task(
                    created.id,
                    Task {
                        id: TaskId::UNSAVED,
                        operation_order: Vec::new(),
                        ..task
                    },
                )
                .await?;

            let mut operation_ids = HashMap::new();
            for operation in operations {
                let old_id = operation.id;
                let new_op = self
                    .add_operation(
                        new_task.id,
                        Operation {
                            id: OperationId::UNSAVED,
                            ..operation
                        },
                    )
                    .await?;
                operation_ids.insert(old_id, new_op.id);
            }

            if !operation_order.is_empty() {
                new_task.operation_order = remap(&operation_order, &operation_ids);
                self.repo.update_task(new_task.clone()).await?;
            }
            task_ids.insert(old_task_id, new_task.id);
        }

        if !task_order.is_empty() {
            created.task_order = remap(&task_order, &task_ids);
            created = self.repo.update_job(created).await?;
        }
        tracing::info!(job = %created.name, id = %created.id, "imported job");
        Ok(created)
    }

    async fn task_ids(&self, job_id: JobId) -> Result<Vec<i64>, FramebotError> {
        Ok(self
            .repo
            .list_tasks(job_id)
            .await?
            .iter()
            .map(|t| t.id.get())
            .collect())
    }

    async fn operation_ids(&self, task_id: TaskId) -> Result<Vec<i64>, FramebotError> {
        Ok(self
            .repo
            .list_operations(task_id)
            .await?
            .iter()
            .map(|o| o.id.get())
            .collect())
    }
}

fn not_found(entity: &'static str, id: impl ToString) -> FramebotError {
    NotFoundError {
        entity,
        id: id.to_string(),
    }
    .into()
}

/// Every id in `order` must be one of `children`.
fn check_order(
    parent: &'static str,
    order: impl IntoIterator<Item = i64>,
    children: &[i64],
) -> Result<(), ValidationError> {
    match order.into_iter().find(|id| !children.contains(id)) {
        Some(id) => Err(ValidationError::UnknownChild { parent, id }),
        None => Ok(()),
    }
}

fn remap<Id: Copy + Eq + std::hash::Hash>(order: &[Id], ids: &HashMap<Id, Id>) -> Vec<Id> {
    order.iter().filter_map(|old| ids.get(old).copied()).collect()
}
