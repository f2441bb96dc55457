//! Configuration module for the leadflow backend.
//!
//! Process configuration is loaded from environment variables with sensible defaults.
//! Scoring and assignment tunables live in [`crate::models::EngineSettings`] and are
//! stored in the database.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Maximum number of leads a bulk operation works on at once
    pub bulk_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("LEADFLOW_DB_PATH")
            .unwrap_or_else(|_| "./data/leadflow.sqlite".to_string())
            .into();

        let bind_addr = env::var("LEADFLOW_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| {
                AppError::Configuration(format!("Invalid LEADFLOW_BIND_ADDR format: {}", e))
            })?;

        let log_level = env::var("LEADFLOW_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let bulk_concurrency = match env::var("LEADFLOW_BULK_CONCURRENCY") {
            Ok(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| {
                    AppError::Configuration(format!(
                        "Invalid LEADFLOW_BULK_CONCURRENCY: {:?} (expected a positive integer)",
                        raw
                    ))
                })?,
            Err(_) => 4,
        };

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            bulk_concurrency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both cases share one test so they never race on the process environment.
    #[test]
    fn test_config_from_env() {
        env::remove_var("LEADFLOW_DB_PATH");
        env::remove_var("LEADFLOW_BIND_ADDR");
        env::remove_var("LEADFLOW_LOG_LEVEL");
        env::remove_var("LEADFLOW_BULK_CONCURRENCY");

        let config = Config::from_env().unwrap();

        assert_eq!(config.db_path, PathBuf::from("./data/leadflow.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.bulk_concurrency, 4);

        env::set_var("LEADFLOW_BULK_CONCURRENCY", "0");
        assert!(matches!(
            Config::from_env(),
            Err(AppError::Configuration(_))
        ));
        env::remove_var("LEADFLOW_BULK_CONCURRENCY");
    }
}
