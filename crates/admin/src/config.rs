//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `ADMIN_HOST` - Health endpoint bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Health endpoint port (default: 3001)
//! - `SYNC_INTERVAL_SECS` - Reconciliation sweep period (default: 300)
//! - `SYNC_CONCURRENCY` - Users checked in parallel per sweep (default: 1)
//! - `SYNC_AUDIT_REPAIRS` - Write an audit event per automatic repair (default: true)
//! - `ARCHIVE_INTERVAL_HOURS` - Archival pass period (default: 24)
//! - `ARCHIVE_MIN_AGE_DAYS` - Account age before archival (default: 365)
//! - `STORE_TIMEOUT_SECS` - Per-call record store deadline (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const SECS_PER_HOUR: u64 = 3600;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the health endpoint to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Reconciliation sweep settings
    pub sync: SyncConfig,
    /// Archival scheduler settings
    pub archive: ArchiveConfig,
    /// Deadline for each record store call
    pub store_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Reconciliation sweep settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub interval: Duration,
    pub concurrency: usize,
    pub audit_repairs: bool,
}

/// Archival scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveConfig {
    pub interval: Duration,
    pub min_age_days: u32,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AdminConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let database_url = env.database_url("ADMIN_DATABASE_URL")?;
        let host = env.parsed("ADMIN_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parsed("ADMIN_PORT", 3001_u16)?;

        let sync = SyncConfig {
            interval: Duration::from_secs(env.positive("SYNC_INTERVAL_SECS", 300)?),
            concurrency: env.positive("SYNC_CONCURRENCY", 1)?,
            audit_repairs: env.flag("SYNC_AUDIT_REPAIRS", true)?,
        };
        let archive = ArchiveConfig {
            interval: Duration::from_secs(
                env.positive::<u64>("ARCHIVE_INTERVAL_HOURS", 24)?
                    .saturating_mul(SECS_PER_HOUR),
            ),
            min_age_days: env.positive("ARCHIVE_MIN_AGE_DAYS", 365)?,
        };
        let store_timeout = Duration::from_secs(env.positive("STORE_TIMEOUT_SECS", 30)?);

        let sentry_dsn = env.optional("SENTRY_DSN");
        let sentry_environment = env.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .optional("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            sync,
            archive,
            store_timeout,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the health endpoint.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Typed access over a key lookup.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Set and non-blank.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a database URL, falling back to the generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// A count or period that must be greater than zero.
    fn positive<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + Default + PartialEq,
        T::Err: Display,
    {
        let value = self.parsed(key, default)?;
        if value == T::default() {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        Ok(value)
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got {other:?}"),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AdminConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AdminConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("ADMIN_DATABASE_URL", "postgres://localhost/caseflow")]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3001");
        assert_eq!(config.sync.interval, Duration::from_secs(300));
        assert_eq!(config.sync.concurrency, 1);
        assert!(config.sync.audit_repairs);
        assert_eq!(config.archive.interval, Duration::from_secs(24 * 3600));
        assert_eq!(config.archive.min_age_days, 365);
        assert_eq!(config.store_timeout, Duration::from_secs(30));
        assert!(config.sentry_dsn.is_none());
        assert!((config.sentry_traces_sample_rate - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fallback/db")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fallback/db");

        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "ADMIN_DATABASE_URL"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://x/y"),
            ("ADMIN_HOST", "0.0.0.0"),
            ("ADMIN_PORT", "8080"),
            ("SYNC_INTERVAL_SECS", "60"),
            ("SYNC_CONCURRENCY", "4"),
            ("SYNC_AUDIT_REPAIRS", "false"),
            ("ARCHIVE_INTERVAL_HOURS", "6"),
            ("ARCHIVE_MIN_AGE_DAYS", "30"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.sync.interval, Duration::from_secs(60));
        assert_eq!(config.sync.concurrency, 4);
        assert!(!config.sync.audit_repairs);
        assert_eq!(config.archive.interval, Duration::from_secs(6 * 3600));
        assert_eq!(config.archive.min_age_days, 30);
    }

    #[test]
    fn test_zero_is_rejected() {
        for key in [
            "SYNC_INTERVAL_SECS",
            "SYNC_CONCURRENCY",
            "ARCHIVE_INTERVAL_HOURS",
            "ARCHIVE_MIN_AGE_DAYS",
            "STORE_TIMEOUT_SECS",
        ] {
            let err = load(&[("DATABASE_URL", "postgres://x/y"), (key, "0")]).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == key),
                "{key} accepted zero"
            );
        }
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("DATABASE_URL", "postgres://x/y"), ("ADMIN_PORT", "http")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[("DATABASE_URL", "postgres://x/y"), ("SYNC_AUDIT_REPAIRS", "maybe")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[("DATABASE_URL", "postgres://x/y"), ("SYNC_CONCURRENCY", "-1")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = load(&[("DATABASE_URL", "postgres://user:hunter2@db/caseflow")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
    }
}
