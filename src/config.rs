use std::env;
use std::path::PathBuf;

use chrono_tz::Tz;

use crate::utils::DISPLAY_TIMEZONE;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid DISPLAY_TIMEZONE: {0}")]
    InvalidTimezone(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// JSON server registry overriding the built-in one
    pub registry_path: Option<PathBuf>,
    pub display_timezone: Tz,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let display_timezone = match env::var("DISPLAY_TIMEZONE") {
            Ok(name) => name
                .parse::<Tz>()
                .map_err(|_| ConfigError::InvalidTimezone(name))?,
            Err(_) => DISPLAY_TIMEZONE,
        };

        Ok(Config {
            registry_path: env::var("SERVER_REGISTRY_PATH")
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            display_timezone,
        })
    }
}
