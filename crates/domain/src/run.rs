//! Run state: per-level state machine and the report of a finished run.
//!
//! Every job, task and operation in a run moves through
//! `Pending → Running → {Succeeded, Failed}` or `Pending → Skipped`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{JobId, OperationId, RunId, TaskId};
use crate::time::Timestamp;

/// Lifecycle state of one schedulable item.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl StepState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTransition`] for any move other than
    /// `Pending → Running`, `Pending → Skipped`, `Running → Succeeded` and
    /// `Running → Failed`.
    pub fn advance(self, next: Self) -> Result<Self, ValidationError> {
        match (self, next) {
            (Self::Pending, Self::Running | Self::Skipped)
            | (Self::Running, Self::Succeeded | Self::Failed) => Ok(next),
            (from, to) => Err(ValidationError::InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationReport {
    pub operation_id: OperationId,
    pub name: String,
    pub state: StepState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub task_id: TaskId,
    pub name: String,
    pub state: StepState,
    pub operations: Vec<OperationReport>,
}

/// Outcome of one job run, as seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub job_id: JobId,
    pub job_name: String,
    pub state: StepState,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    pub tasks: Vec<TaskReport>,
}

impl RunReport {
    #[must_use]
    pub fn new(run_id: RunId, job_id: JobId, job_name: impl Into<String>, started_at: Timestamp) -> Self {
        Self {
            run_id,
            job_id,
            job_name: job_name.into(),
            state: StepState::Pending,
            started_at,
            finished_at: None,
            tasks: Vec::new(),
        }
    }

    /// Operations that actually ran (succeeded or failed).
    #[must_use]
    pub fn executed_operations(&self) -> usize {
        self.tasks
            .iter()
            .flat_map(|t| &t.operations)
            .filter(|o| matches!(o.state, StepState::Succeeded | StepState::Failed))
            .count()
    }

    #[must_use]
    pub fn task(&self, task_id: TaskId) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }
}

/// Progress notifications published while a run executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Started {
        run_id: RunId,
        job_id: JobId,
        job_name: String,
    },
    TaskChanged {
        run_id: RunId,
        task_id: TaskId,
        name: String,
        state: StepState,
    },
    OperationChanged {
        run_id: RunId,
        operation_id: OperationId,
        name: String,
        state: StepState,
    },
    /// Terminal: the whole job completed.
    Succeeded { report: RunReport },
    /// Terminal: the run stopped at the first failure.
    Failed { report: RunReport, error: String },
}

impl RunEvent {
    #[must_use]
    pub fn run_id(&self) -> RunId {
        match self {
            Self::Started { run_id, .. }
            | Self::TaskChanged { run_id, .. }
            | Self::OperationChanged { run_id, .. } => *run_id,
            Self::Succeeded { report } | Self::Failed { report, .. } => report.run_id,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_allow_happy_path_transitions() {
        let state = StepState::Pending
            .advance(StepState::Running)
            .and_then(|s| s.advance(StepState::Succeeded))
            .unwrap();
        assert_eq!(state, StepState::Succeeded);
        assert!(state.is_terminal());
    }

    #[test]
    fn should_allow_skipping_from_pending() {
        assert_eq!(
            StepState::Pending.advance(StepState::Skipped),
            Ok(StepState::Skipped)
        );
    }

    #[test]
    fn should_reject_leaving_a_terminal_state() {
        let result = StepState::Failed.advance(StepState::Running);
        assert_eq!(
            result,
            Err(ValidationError::InvalidTransition {
                from: StepState::Failed,
                to: StepState::Running,
            })
        );
    }

    #[test]
    fn should_reject_skipping_a_running_item() {
        assert!(StepState::Running.advance(StepState::Skipped).is_err());
    }

    #[test]
    fn should_count_only_executed_operations() {
        let mut report = RunReport::new(RunId::new(), JobId::new(1), "job", crate::time::now());
        report.tasks.push(TaskReport {
            task_id: TaskId::new(1),
            name: "t".to_string(),
            state: StepState::Failed,
            operations: vec![
                OperationReport {
                    operation_id: OperationId::new(1),
                    name: "a".to_string(),
                    state: StepState::Succeeded,
                },
                OperationReport {
                    operation_id: OperationId::new(2),
                    name: "b".to_string(),
                    state: StepState::Skipped,
                },
                OperationReport {
                    operation_id: OperationId::new(3),
                    name: "c".to_string(),
                    state: StepState::Failed,
                },
            ],
        });
        assert_eq!(report.executed_operations(), 2);
        assert!(report.task(TaskId::new(1)).is_some());
        assert!(report.task(TaskId::new(2)).is_none());
    }

    #[test]
    fn should_tag_run_events_by_type() {
        let run_id = RunId::new();
        let event = RunEvent::TaskChanged {
            run_id,
            task_id: TaskId::new(4),
            name: "mail".to_string(),
            state: StepState::Skipped,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "task_changed");
        assert_eq!(json["state"], "skipped");
        assert_eq!(event.run_id(), run_id);
        assert!(!event.is_terminal());
    }
}
