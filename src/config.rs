use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use dotenvy::dotenv;
use url::Url;

use crate::gateway::BookingFallback;

pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_PREFS_DIR: &str = ".medassist";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Absent means the document store runs in memory.
    pub database_url: Option<String>,
    pub prefs_dir: PathBuf,
    pub identity_api_key: Option<String>,
    pub identity_base_url: Url,
    pub booking_fallback: BookingFallback,
}

impl FromStr for BookingFallback {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(BookingFallback::Propagate),
            "synthetic" => Ok(BookingFallback::Synthetic),
            _ => Err(ConfigError::Invalid { key: "MEDASSIST_BOOKING_FALLBACK", value: s.to_string() }),
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let identity_base_url = match non_empty("IDENTITY_BASE_URL") {
            Some(raw) => Url::parse(&raw)
                .map_err(|_| ConfigError::Invalid { key: "IDENTITY_BASE_URL", value: raw })?,
            None => Url::parse(DEFAULT_IDENTITY_BASE_URL)
                .map_err(|_| ConfigError::Invalid { key: "IDENTITY_BASE_URL", value: DEFAULT_IDENTITY_BASE_URL.to_string() })?,
        };

        let booking_fallback = match non_empty("MEDASSIST_BOOKING_FALLBACK") {
            Some(raw) => raw.parse()?,
            None => BookingFallback::default(),
        };

        Ok(Config {
            database_url: non_empty("DATABASE_URL"),
            prefs_dir: non_empty("MEDASSIST_PREFS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFS_DIR)),
            identity_api_key: non_empty("IDENTITY_API_KEY"),
            identity_base_url,
            booking_fallback,
        })
    }
}
