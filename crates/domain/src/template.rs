//! Reference image naming.
//!
//! Templates are addressed by a relative file name under a configured
//! directory. Images captured for an operation follow a fixed convention:
//! `{operation}-screen.{ext}`, `{operation}-click.{ext}` and
//! `{operation}-percentmatch.{ext}`.

use serde::{Deserialize, Serialize};

/// Default file extension for captured templates.
pub const DEFAULT_EXTENSION: &str = "png";

/// What a template is used for within an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateRole {
    /// Presence check for the screen the operation expects.
    Screen,
    /// Image located and clicked.
    Click,
    /// Presence check gating a percentage click.
    PercentMatch,
}

impl TemplateRole {
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Screen => "screen",
            Self::Click => "click",
            Self::PercentMatch => "percentmatch",
        }
    }
}

/// Conventional file name for an operation's template.
#[must_use]
pub fn template_file_name(operation_name: &str, role: TemplateRole, extension: &str) -> String {
    format!("{operation_name}-{}.{extension}", role.suffix())
}

/// How a presence check compares a template against the frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The frame *is* the template screen (whole-frame check, looser threshold).
    #[default]
    Is,
    /// The template appears somewhere *in* the frame (sub-region check, stricter threshold).
    In,
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Is => f.write_str("is"),
            Self::In => f.write_str("in"),
        }
    }
}

/// A named screen and the template that recognises it.
///
/// Used to answer "which screen is the window showing right now?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenProbe {
    pub name: String,
    pub template: String,
    #[serde(default)]
    pub mode: MatchMode,
}
