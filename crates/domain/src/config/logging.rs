use super::errors::ConfigError;
use serde::{Deserialize, Serialize};

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    pub fn new(level: &str) -> Result<Self, ConfigError> {
        let level = level.trim().to_ascii_lowercase();
        if !LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Unknown log level '{}', expected one of {}",
                level,
                LEVELS.join(", ")
            )));
        }
        Ok(Self { level })
    }
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
