//! Configuration loader for the `alarmclock-server` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::{env, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Result};

use crate::service::NextAlarmPolicy;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional environment variable through `FromStr`, with a default.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Which [`crate::store::AlarmStore`] backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "postgres" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            other => Err(anyhow!("unknown store '{}' (expected postgres or memory)", other)),
        }
    }
}

/// `true`/`false` flag in the same spellings `FORCE_COLOR` accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Flag(bool);

impl FromStr for Flag {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1" | "true" | "yes" => Ok(Flag(true)),
            "0" | "false" | "no" => Ok(Flag(false)),
            other => Err(anyhow!("expected true or false, got '{}'", other)),
        }
    }
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string. Empty when running on the memory store.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Seconds to wait for a pooled connection before failing the request.
    pub db_acquire_timeout_secs: u32,

    /// TCP port the HTTP server listens on.
    pub port: u16,

    /// Directory holding the browser front end.
    pub static_dir: PathBuf,

    /// Cap the alarm set at a single row.
    pub singleton: bool,

    /// How the next alarm is chosen.
    pub next_alarm_policy: NextAlarmPolicy,

    /// Backing store.
    pub store: StoreKind,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string (unless `ALARM_STORE=memory`)
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `DB_ACQUIRE_TIMEOUT_SECS` – pool acquire timeout (default: 5)
/// - `PORT` – listen port (default: 3000)
/// - `STATIC_DIR` – front end directory (default: `public`)
/// - `ALARM_SINGLETON` – keep at most one alarm row (default: false)
/// - `NEXT_ALARM_POLICY` – `server-clock` (default) or `record-timezone`
/// - `ALARM_STORE` – `postgres` (default) or `memory`
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let store = parse_env!("ALARM_STORE", StoreKind, StoreKind::Postgres);
    let db_url = match store {
        StoreKind::Postgres => require_env!("DATABASE_URL"),
        StoreKind::Memory => env::var("DATABASE_URL").unwrap_or_default(),
    };
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let db_acquire_timeout_secs = parse_env_u32!("DB_ACQUIRE_TIMEOUT_SECS", 5);
    let port = parse_env!("PORT", u16, 3000);
    let static_dir = env::var("STATIC_DIR").map_or_else(|_| PathBuf::from("public"), PathBuf::from);
    let Flag(singleton) = parse_env!("ALARM_SINGLETON", Flag, Flag(false));
    let next_alarm_policy = parse_env!(
        "NEXT_ALARM_POLICY",
        NextAlarmPolicy,
        NextAlarmPolicy::ServerClock
    );

    Ok(Config {
        db_url,
        db_pool_max,
        db_acquire_timeout_secs,
        port,
        static_dir,
        singleton,
        next_alarm_policy,
        store,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  ALARM_STORE             : {:?}", self.store);
        tracing::info!("  DATABASE_URL            : {}", self.masked_db_url());
        tracing::info!("  DB_POOL_MAX             : {}", self.db_pool_max);
        tracing::info!("  DB_ACQUIRE_TIMEOUT_SECS : {}", self.db_acquire_timeout_secs);
        tracing::info!("  PORT                    : {}", self.port);
        tracing::info!("  STATIC_DIR              : {}", self.static_dir.display());
        tracing::info!("  ALARM_SINGLETON         : {}", self.singleton);
        tracing::info!("  NEXT_ALARM_POLICY       : {}", self.next_alarm_policy);
    }

    /// Database URL with the password replaced by `****`.
    pub fn masked_db_url(&self) -> String {
        // ---
        if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                // `postgres://user@host` has its only colon in the scheme
                if !self.db_url[colon_pos..].starts_with("://") {
                    return format!(
                        "{}:****{}",
                        &self.db_url[..colon_pos],
                        &self.db_url[at_pos..]
                    );
                }
            }
        }
        self.db_url.clone()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn config_with_url(db_url: &str) -> Config {
        Config {
            db_url: db_url.to_string(),
            db_pool_max: 5,
            db_acquire_timeout_secs: 5,
            port: 3000,
            static_dir: PathBuf::from("public"),
            singleton: false,
            next_alarm_policy: NextAlarmPolicy::ServerClock,
            store: StoreKind::Postgres,
        }
    }

    #[test]
    fn test_masks_password() {
        // ---
        let cfg = config_with_url("postgres://alarm:s3cret@db:5432/alarms");
        assert_eq!(cfg.masked_db_url(), "postgres://alarm:****@db:5432/alarms");
    }

    #[test]
    fn test_leaves_passwordless_url_alone() {
        // ---
        let cfg = config_with_url("postgres://alarm@db/alarms");
        assert_eq!(cfg.masked_db_url(), "postgres://alarm@db/alarms");

        let cfg = config_with_url("postgres://db/alarms");
        assert_eq!(cfg.masked_db_url(), "postgres://db/alarms");
    }

    #[test]
    fn test_flag_and_store_parsing() {
        // ---
        assert_eq!("yes".parse::<Flag>().unwrap(), Flag(true));
        assert_eq!("0".parse::<Flag>().unwrap(), Flag(false));
        assert!("maybe".parse::<Flag>().is_err());
        assert_eq!("memory".parse::<StoreKind>().unwrap(), StoreKind::Memory);
        assert!("mysql".parse::<StoreKind>().is_err());
    }
}
