use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::Context;
use chrono::Duration;
use tracing::info;

/// Selects the in-process adapters instead of SQLite.
pub const MEMORY_DATABASE: &str = "memory";

/// Longest accepted token lifetime, one year.
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub token_ttl: Duration,
    pub allowed_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3002,
            database_url: "sqlite://notes.db".into(),
            token_ttl: Duration::hours(1),
            allowed_origin: "*".into(),
        }
    }
}

impl Config {
    /// Reads `.env` when present, then the process environment.
    pub fn load() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let ttl_secs: i64 = try_load(&lookup, "TOKEN_TTL_SECS", defaults.token_ttl.num_seconds())?;
        let token_ttl = token_ttl(ttl_secs)?;

        Ok(Self {
            port: try_load(&lookup, "PORT", defaults.port)?,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            token_ttl,
            allowed_origin: lookup("ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin),
        })
    }

    pub fn uses_memory(&self) -> bool {
        self.database_url == MEMORY_DATABASE
    }
}

fn token_ttl(secs: i64) -> anyhow::Result<Duration> {
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
        anyhow::bail!(
            "Invalid TOKEN_TTL_SECS value: {} (must be between 1 and {})",
            secs,
            MAX_TOKEN_TTL_SECS
        );
    }
    Duration::try_seconds(secs).with_context(|| format!("Invalid TOKEN_TTL_SECS value: {}", secs))
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {} value: {}", key, raw)),
        None => {
            info!("{} not set, using default: {}", key, default);
            Ok(default)
        }
    }
}
