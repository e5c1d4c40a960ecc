//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`FramebotError`] via `#[from]` (domain) or `From` impls (adapters).

use crate::run::StepState;

/// Workspace-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum FramebotError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A requested record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// An automation step failed.
    #[error("automation error")]
    Automation(#[from] AutomationError),

    /// The persistence layer failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A platform capability (window, capture, input, template IO) failed.
    #[error("platform error")]
    Platform(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FramebotError {
    /// Borrow the automation failure, if this is one.
    #[must_use]
    pub fn as_automation(&self) -> Option<&AutomationError> {
        match self {
            Self::Automation(err) => Some(err),
            _ => None,
        }
    }

    /// Whether a retry wrapper may swallow this failure and try again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.as_automation().is_some_and(AutomationError::is_retryable)
    }
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("name `{0}` is already taken")]
    DuplicateName(String),

    #[error("window title must not be empty")]
    EmptyWindowTitle,

    #[error("{axis} fraction {value} is outside [0, 1]")]
    FractionOutOfRange { axis: &'static str, value: f64 },

    #[error("click count must be at least 1")]
    ZeroClickCount,

    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("unknown operation kind `{0}`")]
    UnknownOperationKind(String),

    #[error("id {id} is not a child of this {parent}")]
    UnknownChild { parent: &'static str, id: i64 },

    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: StepState, to: StepState },
}

/// A lookup returned nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failures raised while driving the target window.
#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    /// The template was not found at the required confidence.
    #[error("template `{template}` not found on screen")]
    NoMatch { template: String },

    /// The gating screen check failed; the UI has likely not transitioned yet.
    #[error("screen `{template}` is not showing yet")]
    NotYetReady { template: String },

    /// A bounded wait exceeded its budget.
    #[error("timed out after {seconds}s waiting for `{template}`")]
    Timeout { template: String, seconds: u64 },

    /// Retries for an operation are exhausted.
    #[error("cannot proceed with operation `{operation}`")]
    CannotProceed { operation: String },

    /// The automation process and the target window run at different privilege levels.
    #[error("insufficient privileges to drive window `{window}`")]
    PermissionDenied { window: String },

    /// No window carries the requested title.
    #[error("window `{title}` not found")]
    WindowNotFound { title: String },

    /// The operation is malformed or of an unknown kind.
    #[error("operation `{operation}` is misconfigured")]
    Configuration {
        operation: String,
        #[source]
        source: ValidationError,
    },
}

impl AutomationError {
    /// Only a missing template and a not-yet-reached gate are worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoMatch { .. } | Self::NotYetReady { .. })
    }
}
