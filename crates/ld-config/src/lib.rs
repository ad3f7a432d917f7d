//! # ld-config
//!
//! Layered settings for the lab-desk binary.
//!
//! Precedence, lowest first: struct defaults, an optional
//! `config/lab-desk.{toml,yaml,json}` file, then `LAB_DESK_*` environment
//! variables (`__` separates nested keys, e.g. `LAB_DESK_SERVER__PORT`).
//! Call [`load_dotenv`] first so a `.env` file can feed both the logger
//! and the `LAB_DESK_*` variables.

use std::path::PathBuf;

use chrono::TimeDelta;
use config::{Config, Environment, File, FileFormat};
use ld_core::policy::{EnginePolicy, DEFAULT_URGENCY_THRESHOLD_SECS};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub policy: PolicySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self { url: "sqlite:lab_desk.db".into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub urgency_threshold_secs: u64,
    pub notify_on_start: bool,
    pub notify_on_create: bool,
    /// How often the binary logs tickets eligible for escalation.
    pub sweep_interval_secs: u64,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            urgency_threshold_secs: DEFAULT_URGENCY_THRESHOLD_SECS as u64,
            notify_on_start: true,
            notify_on_create: true,
            sweep_interval_secs: 60,
        }
    }
}

impl Settings {
    /// Reads the optional config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/lab-desk").required(false))
            .add_source(
                Environment::with_prefix("LAB_DESK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(config)
    }

    /// Parses settings from an in-memory TOML document.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.policy.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid("policy.sweep_interval_secs must be positive".into()));
        }
        self.urgency_threshold()?;
        Ok(())
    }

    pub fn urgency_threshold(&self) -> Result<TimeDelta, ConfigError> {
        i64::try_from(self.policy.urgency_threshold_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| ConfigError::Invalid("policy.urgency_threshold_secs is too large".into()))
    }

    pub fn engine_policy(&self) -> Result<EnginePolicy, ConfigError> {
        Ok(EnginePolicy {
            urgency_threshold: self.urgency_threshold()?,
            notify_on_start: self.policy.notify_on_start,
            notify_on_create: self.policy.notify_on_create,
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

/// Loads `.env` from the working directory or an ancestor into the process
/// environment. Returns the file used, or `None` when there is none.
///
/// Nothing is logged here: this runs before the logger is configured.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    missing_is_fine(dotenvy::dotenv())
}

fn missing_is_fine(result: dotenvy::Result<PathBuf>) -> Result<Option<PathBuf>, dotenvy::Error> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_missing_dotenv_is_not_an_error() {
        let missing = dotenvy::Error::Io(io::Error::new(io::ErrorKind::NotFound, "no .env"));
        assert!(matches!(missing_is_fine(Err(missing)), Ok(None)));

        let found = missing_is_fine(Ok(PathBuf::from(".env"))).unwrap();
        assert_eq!(found, Some(PathBuf::from(".env")));

        let broken = dotenvy::Error::LineParse("KEY=\"unterminated".into(), 4);
        assert!(missing_is_fine(Err(broken)).is_err());
    }

    #[test]
    fn test_defaults_when_empty() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.bind_address(), ("127.0.0.1".to_string(), 8080));
        assert_eq!(settings.database.url, "sqlite:lab_desk.db");

        let policy = settings.engine_policy().unwrap();
        assert_eq!(policy, EnginePolicy::default());
    }

    #[test]
    fn test_partial_override() {
        let settings = Settings::from_toml(
            r#"
            [server]
            port = 9000

            [policy]
            urgency_threshold_secs = 300
            notify_on_start = false
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 9000);
        let policy = settings.engine_policy().unwrap();
        assert_eq!(policy.urgency_threshold, TimeDelta::seconds(300));
        assert!(!policy.notify_on_start);
        assert!(policy.notify_on_create);
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let err = Settings::from_toml("[policy]\nsweep_interval_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
