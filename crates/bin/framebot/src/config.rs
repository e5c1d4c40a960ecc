//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `framebot.toml` in the working directory unless a path is given
//! on the command line. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use framebot_app::automation_engine::{EngineConfig, Thresholds};
use framebot_app::scheduler::SchedulerConfig;
use framebot_domain::template::{DEFAULT_EXTENSION, ScreenProbe};

/// Default configuration file name.
pub const DEFAULT_PATH: &str = "framebot.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub templates: TemplatesConfig,
    pub engine: EngineSection,
    pub scheduler: SchedulerSection,
    pub desktop: DesktopConfig,
    /// Probes tried in order by `framebot identify`.
    pub screens: Vec<ScreenProbe>,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
    /// Also write a daily-rotated log file here.
    pub directory: Option<PathBuf>,
}

/// Reference image location.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub directory: PathBuf,
    /// Appended to template names that have no extension.
    pub extension: String,
}

/// `[engine]` section, in milliseconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub retry_limit: u32,
    pub dry_run: bool,
    pub retry_pause_ms: u64,
    pub click_pause_ms: u64,
    pub poll_interval_ms: u64,
    pub thresholds: Thresholds,
}

/// `[scheduler]` section, in milliseconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub sleep_between_tasks_ms: u64,
    pub sleep_between_operations_ms: u64,
}

/// Desktop backend. Runs replay captured frames from `replay_dir`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    pub replay_dir: Option<PathBuf>,
    /// Screen position of the replayed window.
    pub left: i32,
    pub top: i32,
}

impl Config {
    /// Load configuration from `path` (or `framebot.toml`, if present), then
    /// apply environment-variable overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, an override
    /// does not parse, or a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path, true)?,
            None => Self::from_file(Path::new(DEFAULT_PATH), false)?,
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Apply overrides read through `lookup` (the process environment in
    /// production).
    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("FRAMEBOT_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("FRAMEBOT_TEMPLATES_DIR") {
            self.templates.directory = PathBuf::from(val);
        }
        if let Some(val) = lookup("FRAMEBOT_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("FRAMEBOT_LOG_DIR") {
            self.logging.directory = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup("FRAMEBOT_RETRY_LIMIT") {
            self.engine.retry_limit = val
                .parse()
                .map_err(|_| ConfigError::Override("FRAMEBOT_RETRY_LIMIT", val))?;
        }
        if let Some(val) = lookup("FRAMEBOT_DRY_RUN") {
            self.engine.dry_run = match val.as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => return Err(ConfigError::Override("FRAMEBOT_DRY_RUN", val)),
            };
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.retry_limit == 0 {
            return Err(ConfigError::Validation(
                "engine.retry_limit must be at least 1".to_string(),
            ));
        }
        if self.engine.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "engine.poll_interval_ms must be non-zero".to_string(),
            ));
        }
        if self.templates.extension.trim().is_empty() {
            return Err(ConfigError::Validation(
                "templates.extension must not be empty".to_string(),
            ));
        }
        let thresholds = self.engine.thresholds;
        for (name, value) in [
            ("screen", thresholds.screen),
            ("region", thresholds.region),
            ("click", thresholds.click),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "engine.thresholds.{name} must be within [-1, 1], got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            retry_limit: self.engine.retry_limit,
            retry_pause: Duration::from_millis(self.engine.retry_pause_ms),
            click_pause: Duration::from_millis(self.engine.click_pause_ms),
            poll_interval: Duration::from_millis(self.engine.poll_interval_ms),
            thresholds: self.engine.thresholds,
            dry_run: self.engine.dry_run,
        }
    }

    #[must_use]
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            task_pause: Duration::from_millis(self.scheduler.sleep_between_tasks_ms),
            operation_pause: Duration::from_millis(self.scheduler.sleep_between_operations_ms),
            engine: self.engine_config(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:framebot.db".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "framebot=info,framebot_app=info,warn".to_string(),
            directory: None,
        }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("templates"),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        let defaults = EngineConfig::default();
        Self {
            retry_limit: defaults.retry_limit,
            dry_run: defaults.dry_run,
            retry_pause_ms: millis(defaults.retry_pause),
            click_pause_ms: millis(defaults.click_pause),
            poll_interval_ms: millis(defaults.poll_interval),
            thresholds: defaults.thresholds,
        }
    }
}

impl Default for SchedulerSection {
    fn default() -> Self {
        let defaults = SchedulerConfig::default();
        Self {
            sleep_between_tasks_ms: millis(defaults.task_pause),
            sleep_between_operations_ms: millis(defaults.operation_pause),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// An environment override holds an unusable value.
    #[error("invalid value `{1}` for {0}")]
    Override(&'static str, String),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
