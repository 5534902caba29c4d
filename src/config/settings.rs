use anyhow::{bail, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub calendar: CalendarConfig,
    pub executor: ExecutorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Calendar used when an operation does not name one
    #[serde(default)]
    pub default_calendar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    pub interpreter: String,
    pub script_flag: String,
    pub timeout_ms: u64,
    pub stderr_policy: StderrPolicy,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            interpreter: "osascript".to_string(),
            script_flag: "-e".to_string(),
            timeout_ms: 30_000,
            stderr_policy: StderrPolicy::Warn,
        }
    }
}

/// What to do with stderr output from a run that exited successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StderrPolicy {
    /// Log it and attach it to the output
    Warn,
    /// Treat it as a failed run
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// Load from `config/<CONFIG_ENV>`, `OSABRIDGE__*` variables and `DEFAULT_CALENDAR`
    pub fn new() -> Result<Self> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let builder = Self::defaults()?
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(
                Environment::with_prefix("OSABRIDGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("calendar.default_calendar", env::var("DEFAULT_CALENDAR").ok())?;

        Self::finish(builder)
    }

    /// Load from a single file on top of the built-in defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = Self::defaults()?.add_source(File::from(path).required(true));
        Self::finish(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let executor = ExecutorConfig::default();
        Config::builder()
            .set_default("calendar.default_calendar", "")?
            .set_default("executor.interpreter", executor.interpreter)?
            .set_default("executor.script_flag", executor.script_flag)?
            .set_default("executor.timeout_ms", executor.timeout_ms as i64)?
            .set_default("executor.stderr_policy", "warn")?
            .set_default("logging.level", "info")
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.calendar.default_calendar.trim().is_empty() {
            bail!(
                "No default calendar configured. Set DEFAULT_CALENDAR or calendar.default_calendar"
            );
        }
        if self.executor.timeout_ms == 0 {
            bail!("executor.timeout_ms must be greater than zero");
        }
        Ok(())
    }
}
