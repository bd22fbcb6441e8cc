use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::fetch::FetchStrategy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Parent ids per `IN` query when batch-loading children.
    pub batch_fetch_size: usize,
    /// Upper bound for `limit` on paged reads.
    pub max_page_size: i64,
    pub default_strategy: FetchStrategy,
}

impl AppConfig {
    pub const DEFAULT_BATCH_FETCH_SIZE: usize = 100;
    pub const DEFAULT_MAX_PAGE_SIZE: i64 = 1000;

    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 8080)?;
        let batch_fetch_size =
            parse_or(&lookup, "BATCH_FETCH_SIZE", Self::DEFAULT_BATCH_FETCH_SIZE)?;
        let max_page_size = parse_or(&lookup, "MAX_PAGE_SIZE", Self::DEFAULT_MAX_PAGE_SIZE)?;
        let default_strategy = match lookup("DEFAULT_STRATEGY") {
            Some(value) => FetchStrategy::from_str(&value).map_err(|_| ConfigError::Invalid {
                name: "DEFAULT_STRATEGY",
                value,
            })?,
            None => FetchStrategy::ProjectionBatch,
        };

        if batch_fetch_size == 0 {
            return Err(ConfigError::Invalid {
                name: "BATCH_FETCH_SIZE",
                value: "0".to_string(),
            });
        }
        if max_page_size <= 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_PAGE_SIZE",
                value: max_page_size.to_string(),
            });
        }

        Ok(Self {
            database_url,
            host,
            port,
            batch_fetch_size,
            max_page_size,
            default_strategy,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
