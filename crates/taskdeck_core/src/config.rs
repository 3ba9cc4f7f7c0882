//! Runtime configuration for hosts embedding the core.
//!
//! # Invariants
//! - `log_level` is always a supported, normalized level name.
//! - `log_dir`, when set, is absolute.

use crate::logging::LogLevel;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "TASKDECK_DB";
pub const ENV_LOG_LEVEL: &str = "TASKDECK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TASKDECK_LOG_DIR";

const DEFAULT_DB_FILE: &str = "taskdeck.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
    EmptyValue(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::RelativeLogDir(path) => {
                write!(f, "log directory must be absolute: {}", path.display())
            }
            Self::EmptyValue(key) => write!(f, "{key} is set but empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Database and logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_level: LogLevel::build_default(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by `TASKDECK_*` process variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns per variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_DB_PATH) {
            config.db_path = PathBuf::from(non_empty(ENV_DB_PATH, &value)?);
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            config.log_level = LogLevel::parse(non_empty(ENV_LOG_LEVEL, &value)?)
                .map_err(ConfigError::InvalidLogLevel)?;
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            let dir = PathBuf::from(non_empty(ENV_LOG_DIR, &value)?);
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir));
            }
            config.log_dir = Some(dir);
        }

        Ok(config)
    }
}

fn non_empty<'a>(key: &'static str, value: &'a str) -> Result<&'a str, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyValue(key));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use crate::logging::LogLevel;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_variables() {
        let config = CoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn variables_override_defaults() {
        let log_dir = std::env::temp_dir().join("taskdeck-config-test");
        let log_dir_str = log_dir.to_str().unwrap().to_string();
        let config = CoreConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, "/tmp/deck.sqlite3"),
            (ENV_LOG_LEVEL, "Warning"),
            (ENV_LOG_DIR, &log_dir_str),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/deck.sqlite3"));
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.log_dir, Some(log_dir));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            CoreConfig::from_lookup(lookup_from(&[(ENV_LOG_LEVEL, "loud")])),
            Err(ConfigError::InvalidLogLevel(_))
        ));
        assert!(matches!(
            CoreConfig::from_lookup(lookup_from(&[(ENV_LOG_DIR, "logs")])),
            Err(ConfigError::RelativeLogDir(_))
        ));
        assert_eq!(
            CoreConfig::from_lookup(lookup_from(&[(ENV_DB_PATH, "  ")])),
            Err(ConfigError::EmptyValue(ENV_DB_PATH))
        );
    }
}
