//! Server configuration from environment variables.
//!
//! | Variable             | Default                          |
//! |----------------------|----------------------------------|
//! | `DATABASE_URL`       | `postgres://localhost/flashdeck` |
//! | `HOST`               | `0.0.0.0`                        |
//! | `PORT`               | `3000`                           |
//! | `DB_MAX_CONNECTIONS` | `10`                             |
//! | `RUN_MIGRATIONS`     | `true`                           |
//! | `MAX_BODY_BYTES`     | `1048576`                        |
//!
//! Logging variables (`RUST_LOG`, `LOG_FORMAT`, `LOG_FILE`, `LOG_ANSI`) are
//! read by the binary when it installs the subscriber.

use std::net::SocketAddr;
use std::str::FromStr;

use flashdeck_core::{Error, Result};
use flashdeck_db::PoolConfig;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/flashdeck";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            db_max_connections: flashdeck_db::pool::DEFAULT_MAX_CONNECTIONS,
            run_migrations: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            run_migrations: match lookup("RUN_MIGRATIONS") {
                Some(v) => parse_bool("RUN_MIGRATIONS", &v)?,
                None => defaults.run_migrations,
            },
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", defaults.max_body_bytes)?,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid HOST/PORT '{}:{}': {}", self.host, self.port, e)))
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new().max_connections(self.db_max_connections)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Error::Config(format!("invalid {} '{}': expected true/false", key, raw))),
    }
}
