//! Job: a named automation unit bound to one target window.

use serde::{Deserialize, Serialize};

use crate::error::{FramebotError, ValidationError};
use crate::id::{JobId, TaskId};

/// A sequence of tasks driven against the window titled `window_title`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub window_title: String,
    /// Explicit (possibly partial) task order, see [`crate::ordering`].
    #[serde(default)]
    pub task_order: Vec<TaskId>,
}

impl Job {
    /// Create a builder for constructing a [`Job`].
    #[must_use]
    pub fn builder() -> JobBuilder {
        JobBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::Validation`] when `name` or `window_title`
    /// is blank.
    pub fn validate(&self) -> Result<(), FramebotError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.window_title.trim().is_empty() {
            return Err(ValidationError::EmptyWindowTitle.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Job`].
#[derive(Debug, Default)]
pub struct JobBuilder {
    id: Option<JobId>,
    name: Option<String>,
    window_title: Option<String>,
    task_order: Vec<TaskId>,
}

impl JobBuilder {
    #[must_use]
    pub fn id(mut self, id: JobId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = Some(title.into());
        self
    }

    #[must_use]
    pub fn task_order(mut self, order: Vec<TaskId>) -> Self {
        self.task_order = order;
        self
    }

    /// Consume the builder, validate, and return a [`Job`].
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::Validation`] if required fields are missing or empty.
    pub fn build(self) -> Result<Job, FramebotError> {
        let job = Job {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            window_title: self.window_title.unwrap_or_default(),
            task_order: self.task_order,
        };
        job.validate()?;
        Ok(job)
    }
}
