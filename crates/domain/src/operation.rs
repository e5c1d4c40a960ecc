//! Operation: the atomic automation step.
//!
//! Operations are stored the way the authoring surface edits them: a kind
//! tag plus a flat set of optional parameters. [`Operation::step`] turns that
//! loose record into a fully-typed [`Step`] right before execution, which is
//! where malformed or unknown operations are rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FramebotError, ValidationError};
use crate::id::{OperationId, TaskId};
use crate::ordering::Identified;
use crate::template::{DEFAULT_EXTENSION, TemplateRole, template_file_name};

/// Operation discriminant as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationKind {
    ClickImage,
    ClickPercent,
    Wait,
    /// A tag this version does not know how to execute.
    Unknown(String),
}

impl OperationKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ClickImage => "click_img",
            Self::ClickPercent => "click_percent",
            Self::Wait => "wait",
            Self::Unknown(tag) => tag,
        }
    }
}

impl From<String> for OperationKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "click_img" => Self::ClickImage,
            "click_percent" => Self::ClickPercent,
            "wait" => Self::Wait,
            _ => Self::Unknown(tag),
        }
    }
}

impl From<OperationKind> for String {
    fn from(kind: OperationKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific parameters; which ones are required depends on the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationParams {
    /// `click_img`: screen gate. `wait`: screen polled for.
    pub screen_template: Option<String>,
    /// `click_img`: image located and clicked.
    pub click_template: Option<String>,
    pub x_fraction: Option<f64>,
    pub y_fraction: Option<f64>,
    /// `click_percent`: optional screen gate.
    pub match_template: Option<String>,
    pub click_count: u32,
    pub wait_timeout_seconds: Option<u64>,
    /// `wait`: sleep for the whole timeout instead of polling.
    pub implicit_wait: bool,
}

impl Default for OperationParams {
    fn default() -> Self {
        Self {
            screen_template: None,
            click_template: None,
            x_fraction: None,
            y_fraction: None,
            match_template: None,
            click_count: 1,
            wait_timeout_seconds: None,
            implicit_wait: false,
        }
    }
}

/// One step of a [`Task`](crate::task::Task).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub task_id: TaskId,
    pub name: String,
    /// Stored for the authoring surface; runs never consult it.
    #[serde(default)]
    pub ignore_error: bool,
    #[serde(default)]
    pub skip: bool,
    pub kind: OperationKind,
    #[serde(default)]
    pub params: OperationParams,
}

impl Identified for Operation {
    type Id = OperationId;

    fn id(&self) -> OperationId {
        self.id
    }
}

/// A fully-validated, executable operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    ClickImage {
        click_template: String,
        screen_template: String,
        click_count: u32,
    },
    ClickPercent {
        x_fraction: f64,
        y_fraction: f64,
        match_template: Option<String>,
        click_count: u32,
    },
    /// Sleep for the full timeout.
    Sleep { seconds: u64 },
    /// Poll until `screen_template` shows or the timeout elapses.
    WaitUntil {
        screen_template: String,
        timeout_seconds: u64,
    },
}

impl Operation {
    /// Create a builder for constructing an [`Operation`].
    #[must_use]
    pub fn builder() -> OperationBuilder {
        OperationBuilder::default()
    }

    /// Resolve the stored parameters into an executable [`Step`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for unknown kinds, missing required
    /// parameters, zero click counts and out-of-range fractions.
    pub fn step(&self) -> Result<Step, ValidationError> {
        let p = &self.params;
        match &self.kind {
            OperationKind::ClickImage => Ok(Step::ClickImage {
                click_template: required(p.click_template.as_ref(), "click_template")?,
                screen_template: required(p.screen_template.as_ref(), "screen_template")?,
                click_count: click_count(p.click_count)?,
            }),
            OperationKind::ClickPercent => Ok(Step::ClickPercent {
                x_fraction: fraction("x", p.x_fraction, "x_fraction")?,
                y_fraction: fraction("y", p.y_fraction, "y_fraction")?,
                match_template: p
                    .match_template
                    .as_ref()
                    .filter(|t| !t.trim().is_empty())
                    .cloned(),
                click_count: click_count(p.click_count)?,
            }),
            OperationKind::Wait => {
                let timeout_seconds = p
                    .wait_timeout_seconds
                    .ok_or(ValidationError::MissingField {
                        field: "wait_timeout_seconds",
                    })?;
                if p.implicit_wait {
                    Ok(Step::Sleep {
                        seconds: timeout_seconds,
                    })
                } else {
                    Ok(Step::WaitUntil {
                        screen_template: required(p.screen_template.as_ref(), "screen_template")?,
                        timeout_seconds,
                    })
                }
            }
            OperationKind::Unknown(tag) => Err(ValidationError::UnknownOperationKind(tag.clone())),
        }
    }

    /// Check domain invariants, including that the operation is executable.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::Validation`] when the name is blank or
    /// [`Operation::step`] fails.
    pub fn validate(&self) -> Result<(), FramebotError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        self.step()?;
        Ok(())
    }
}

fn required(value: Option<&String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .ok_or(ValidationError::MissingField { field })
}

fn click_count(count: u32) -> Result<u32, ValidationError> {
    if count == 0 {
        return Err(ValidationError::ZeroClickCount);
    }
    Ok(count)
}

fn fraction(
    axis: &'static str,
    value: Option<f64>,
    field: &'static str,
) -> Result<f64, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField { field })?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::FractionOutOfRange { axis, value });
    }
    Ok(value)
}

/// Step-by-step builder for [`Operation`].
///
/// Image templates left unset default to the conventional
/// `{name}-{role}.png` file names.
#[derive(Debug, Default)]
pub struct OperationBuilder {
    id: Option<OperationId>,
    task_id: Option<TaskId>,
    name: Option<String>,
    ignore_error: bool,
    skip: bool,
    kind: Option<OperationKind>,
    params: OperationParams,
}

impl OperationBuilder {
    #[must_use]
    pub fn id(mut self, id: OperationId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn task_id(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
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
    pub fn kind(mut self, kind: OperationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Click an image once the screen gate passes.
    #[must_use]
    pub fn click_image(mut self) -> Self {
        self.kind = Some(OperationKind::ClickImage);
        self
    }

    /// Click at a fraction of the window size.
    #[must_use]
    pub fn click_percent(mut self, x_fraction: f64, y_fraction: f64) -> Self {
        self.kind = Some(OperationKind::ClickPercent);
        self.params.x_fraction = Some(x_fraction);
        self.params.y_fraction = Some(y_fraction);
        self
    }

    /// Wait up to `timeout_seconds` for the screen template to show.
    #[must_use]
    pub fn wait(mut self, timeout_seconds: u64) -> Self {
        self.kind = Some(OperationKind::Wait);
        self.params.wait_timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Turn a wait into an unconditional sleep.
    #[must_use]
    pub fn implicit(mut self) -> Self {
        self.params.implicit_wait = true;
        self
    }

    #[must_use]
    pub fn screen_template(mut self, template: impl Into<String>) -> Self {
        self.params.screen_template = Some(template.into());
        self
    }

    #[must_use]
    pub fn click_template(mut self, template: impl Into<String>) -> Self {
        self.params.click_template = Some(template.into());
        self
    }

    #[must_use]
    pub fn match_template(mut self, template: impl Into<String>) -> Self {
        self.params.match_template = Some(template.into());
        self
    }

    #[must_use]
    pub fn click_count(mut self, count: u32) -> Self {
        self.params.click_count = count;
        self
    }

    /// Consume the builder, validate, and return an [`Operation`].
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::Validation`] if the name or kind is missing
    /// or the parameters do not form an executable step.
    pub fn build(self) -> Result<Operation, FramebotError> {
        let name = self.name.unwrap_or_default();
        let kind = self.kind.ok_or(ValidationError::MissingField { field: "kind" })?;
        let mut params = self.params;

        let convention = |role| template_file_name(&name, role, DEFAULT_EXTENSION);
        match kind {
            OperationKind::ClickImage => {
                params
                    .screen_template
                    .get_or_insert_with(|| convention(TemplateRole::Screen));
                params
                    .click_template
                    .get_or_insert_with(|| convention(TemplateRole::Click));
            }
            OperationKind::Wait if !params.implicit_wait => {
                params
                    .screen_template
                    .get_or_insert_with(|| convention(TemplateRole::Screen));
            }
            _ => {}
        }

        let operation = Operation {
            id: self.id.unwrap_or_default(),
            task_id: self.task_id.unwrap_or_default(),
            name,
            ignore_error: self.ignore_error,
            skip: self.skip,
            kind,
            params,
        };
        operation.validate()?;
        Ok(operation)
    }
}
