//! Centralized configuration for todo-provision.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration.

use aws_dynamo::{ConfigError as DynamoConfigError, DynamoConfig, ProvisionOptions};
use std::env;
use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single lines (`LOG_FORMAT=pretty`, the default)
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Dynamo(#[from] DynamoConfigError),
    #[error("configuration error for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Provisioning configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Table name, endpoint override and region
    pub dynamo: DynamoConfig,
    /// Throughput and readiness polling
    pub provision: ProvisionOptions,
    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let dynamo = DynamoConfig::from_env()?;

        let mut provision = ProvisionOptions::default();
        if let Some(v) = parse_positive::<i64>("READ_CAPACITY")? {
            provision.read_capacity = v;
        }
        if let Some(v) = parse_positive::<i64>("WRITE_CAPACITY")? {
            provision.write_capacity = v;
        }
        if let Some(v) = parse_positive::<u32>("PROVISION_MAX_ATTEMPTS")? {
            provision.max_attempts = v;
        }
        if let Some(ms) = parse_var::<u64>("PROVISION_POLL_MS")? {
            provision.poll_interval = Duration::from_millis(ms);
        }

        let log_format =
            LogFormat::parse(&env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".into()));

        Ok(Self {
            dynamo,
            provision,
            log_format,
        })
    }
}

fn parse_var<T: std::str::FromStr>(field: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(field) {
        Ok(raw) => parse_value(field, &raw),
        Err(_) => Ok(None),
    }
}

/// Like [`parse_var`], rejecting zero and negative values.
fn parse_positive<T>(field: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    let value = parse_var::<T>(field)?;
    ensure_positive(field, value)
}

fn parse_value<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
        field,
        message: format!("invalid value '{raw}': {e}"),
    })
}

fn ensure_positive<T>(field: &'static str, value: Option<T>) -> Result<Option<T>, ConfigError>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    match value {
        Some(v) if v <= T::default() => Err(ConfigError::Invalid {
            field,
            message: format!("must be greater than zero, got {v}"),
        }),
        other => Ok(other),
    }
}
