//! Task: an ordered group of operations inside a job.

use serde::{Deserialize, Serialize};

use crate::error::{FramebotError, ValidationError};
use crate::id::{JobId, OperationId, TaskId};
use crate::ordering::Identified;

/// A named step group owned by a [`Job`](crate::job::Job).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub job_id: JobId,
    pub name: String,
    /// Stored for the authoring surface; runs never consult it.
    #[serde(default)]
    pub ignore_error: bool,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub operation_order: Vec<OperationId>,
}

impl Identified for Task {
    type Id = TaskId;

    fn id(&self) -> TaskId {
        self.id
    }
}

impl Task {
    /// Create a builder for constructing a [`Task`].
    #[must_use]
    pub fn builder() -> TaskBuilder {
        TaskBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::Validation`] when `name` is blank.
    pub fn validate(&self) -> Result<(), FramebotError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Task`].
#[derive(Debug, Default)]
pub struct TaskBuilder {
    id: Option<TaskId>,
    job_id: Option<JobId>,
    name: Option<String>,
    ignore_error: bool,
    skip: bool,
    operation_order: Vec<OperationId>,
}

impl TaskBuilder {
    #[must_use]
    pub fn id(mut self, id: TaskId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn job_id(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn ignore_error(mut self, ignore_error: bool) -> Self {
        self.ignore_error = ignore_error;
        self
    }

    #[must_use]
    pub fn skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    #[must_use]
    pub fn operation_order(mut self, order: Vec<OperationId>) -> Self {
        self.operation_order = order;
        self
    }

    /// Consume the builder, validate, and return a [`Task`].
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::Validation`] if the name is missing or blank.
    pub fn build(self) -> Result<Task, FramebotError> {
        let task = Task {
            id: self.id.unwrap_or_default(),
            job_id: self.job_id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            ignore_error: self.ignore_error,
            skip: self.skip,
            operation_order: self.operation_order,
        };
        task.validate()?;
        Ok(task)
    }
}
