use std::collections::HashMap;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;
use crate::auth::service::DEFAULT_SESSION_EXPIRY_HOURS;

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 60;

/// Upper bounds keep expiry arithmetic far away from overflow.
const MAX_ACCESS_EXPIRY_MINS: i64 = 7 * 24 * 60;
const MAX_SESSION_EXPIRY_HOURS: i64 = 366 * 24;
const MAX_PURGE_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// Startup configuration problem. The server refuses to start.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment")]
    Missing(&'static str),

    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Where users and sessions are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// PostgreSQL via a connection pool.
    Postgres {
        url: String,
        max_connections: u32,
    },
    /// Process-local maps; everything is lost on restart.
    Memory,
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Server configuration loaded from environment variables.
///
/// Everything except `JWT_SECRET` (and `DATABASE_URL` for the postgres
/// driver) has a default suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Budget for background tasks to stop after the listener closes.
    pub shutdown_timeout_secs: u64,
    pub storage: StorageConfig,
    /// JWT token configuration (secret, access token expiry).
    pub jwt: JwtConfig,
    /// Refresh session lifetime in hours (default: `24`).
    pub session_expiry_hours: i64,
    /// Revoke all sessions after a password change (default: `false`).
    pub revoke_sessions_on_password_change: bool,
    /// Expired-session purge period; `0` disables the job.
    pub session_purge_interval_secs: u64,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                              | Default                  |
    /// |--------------------------------------|--------------------------|
    /// | `HOST`                               | `0.0.0.0`                |
    /// | `PORT`                               | `8080`                   |
    /// | `CORS_ORIGINS`                       | `http://localhost:3000`  |
    /// | `REQUEST_TIMEOUT_SECS`               | `30`                     |
    /// | `SHUTDOWN_TIMEOUT_SECS`              | `30`                     |
    /// | `DATABASE_DRIVER`                    | `postgres`               |
    /// | `DATABASE_URL`                       | required for `postgres`  |
    /// | `DATABASE_MAX_CONNECTIONS`           | `20`                     |
    /// | `JWT_SECRET`                         | **required**             |
    /// | `JWT_ACCESS_EXPIRY_MINS`             | `60`                     |
    /// | `SESSION_EXPIRY_HOURS`               | `24`                     |
    /// | `REVOKE_SESSIONS_ON_PASSWORD_CHANGE` | `false`                  |
    /// | `SESSION_PURGE_INTERVAL_SECS`        | `3600`                   |
    /// | `LOG_FORMAT`                         | `pretty`                 |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from a map.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let host = env.string_or("HOST", "0.0.0.0");
        let port = env.parse_or("PORT", 8080u16)?;

        let cors_origins: Vec<String> = env
            .string_or("CORS_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = env.parse_or("REQUEST_TIMEOUT_SECS", 30u64)?;
        let shutdown_timeout_secs = env.parse_or("SHUTDOWN_TIMEOUT_SECS", 30u64)?;

        let storage = match env.string_or("DATABASE_DRIVER", "postgres").as_str() {
            "postgres" => StorageConfig::Postgres {
                url: env.required("DATABASE_URL")?,
                max_connections: env.parse_or("DATABASE_MAX_CONNECTIONS", 20u32)?,
            },
            "memory" => StorageConfig::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    key: "DATABASE_DRIVER",
                    value: other.to_string(),
                    reason: "expected 'postgres' or 'memory'".into(),
                })
            }
        };

        let jwt = JwtConfig {
            secret: env.required("JWT_SECRET")?,
            access_token_expiry_mins: env.bounded_or(
                "JWT_ACCESS_EXPIRY_MINS",
                DEFAULT_ACCESS_EXPIRY_MINS,
                1,
                MAX_ACCESS_EXPIRY_MINS,
            )?,
        };

        let session_expiry_hours = env.bounded_or(
            "SESSION_EXPIRY_HOURS",
            DEFAULT_SESSION_EXPIRY_HOURS,
            1,
            MAX_SESSION_EXPIRY_HOURS,
        )?;
        let revoke_sessions_on_password_change =
            env.parse_or("REVOKE_SESSIONS_ON_PASSWORD_CHANGE", false)?;
        let session_purge_interval_secs =
            env.bounded_or("SESSION_PURGE_INTERVAL_SECS", 3600u64, 0, MAX_PURGE_INTERVAL_SECS)?;

        let log_format = match env.string_or("LOG_FORMAT", "pretty").as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                    reason: "expected 'pretty' or 'json'".into(),
                })
            }
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            storage,
            jwt,
            session_expiry_hours,
            revoke_sessions_on_password_change,
            session_purge_interval_secs,
            log_format,
        })
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn string_or(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        match (self.0)(key) {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(ConfigError::Missing(key)),
        }
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match (self.0)(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn bounded_or<T>(
        &self,
        key: &'static str,
        default: T,
        min: T,
        max: T,
    ) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + std::fmt::Display,
        T::Err: std::fmt::Display,
    {
        let value = self.parse_or(key, default)?;
        if value < min || value > max {
            return Err(ConfigError::Invalid {
                key,
                value: value.to_string(),
                reason: format!("must be between {min} and {max}"),
            });
        }
        Ok(value)
    }
}
