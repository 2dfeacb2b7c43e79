//! Configuration loading and representation.
//!
//! Everything is read from `DRUMYARD_*` environment variables. Unset keys
//! fall back to defaults; set-but-malformed keys are errors.

use std::time::Duration;

use thiserror::Error;

use drumyard_inventory::GridLayout;

use crate::retry::RetryPolicy;

pub const DATABASE_URL: &str = "DRUMYARD_DATABASE_URL";
pub const MAX_CONNECTIONS: &str = "DRUMYARD_MAX_CONNECTIONS";
pub const BUSY_TIMEOUT_MS: &str = "DRUMYARD_BUSY_TIMEOUT_MS";
pub const WRITE_RETRIES: &str = "DRUMYARD_WRITE_RETRIES";
pub const GRID_ROWS: &str = "DRUMYARD_GRID_ROWS";
pub const GRID_COLUMNS: &str = "DRUMYARD_GRID_COLUMNS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Store + layout configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// How long SQLite waits on a held write lock before reporting busy.
    pub busy_timeout: Duration,
    pub retry: RetryPolicy,
    pub layout: GridLayout,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://drumyard.db".to_string(),
            max_connections: 5,
            busy_timeout: Duration::from_millis(5000),
            retry: RetryPolicy::default(),
            layout: GridLayout::default(),
        }
    }
}

impl InventoryConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(url) = lookup(DATABASE_URL) {
            if url.trim().is_empty() {
                return Err(invalid(DATABASE_URL, url, "cannot be empty"));
            }
            cfg.database_url = url;
        }

        if let Some(raw) = lookup(MAX_CONNECTIONS) {
            let n: u32 = parse(MAX_CONNECTIONS, &raw)?;
            if n == 0 {
                return Err(invalid(MAX_CONNECTIONS, raw, "must be at least 1"));
            }
            cfg.max_connections = n;
        }

        if let Some(raw) = lookup(BUSY_TIMEOUT_MS) {
            cfg.busy_timeout = Duration::from_millis(parse(BUSY_TIMEOUT_MS, &raw)?);
        }

        if let Some(raw) = lookup(WRITE_RETRIES) {
            cfg.retry.max_retries = parse(WRITE_RETRIES, &raw)?;
        }

        let rows = lookup(GRID_ROWS);
        let columns = lookup(GRID_COLUMNS);
        if rows.is_some() || columns.is_some() {
            let row_labels: Vec<char> = match &rows {
                Some(r) => r.trim().chars().collect(),
                None => cfg.layout.rows().to_vec(),
            };
            let column_count: u16 = match &columns {
                Some(c) => parse(GRID_COLUMNS, c)?,
                None => cfg.layout.columns(),
            };
            cfg.layout = GridLayout::new(row_labels, column_count).map_err(|e| {
                invalid(
                    GRID_ROWS,
                    rows.clone().unwrap_or_default(),
                    e.to_string(),
                )
            })?;
        }

        Ok(cfg)
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| invalid(key, raw.to_string(), e.to_string()))
}

fn invalid(key: &'static str, value: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.into(),
        reason: reason.into(),
    }
}
