//! Runtime configuration loaded from the process environment.
//!
//! `DATABASE_URL` is required. Every other setting uses a `NODA_` prefix and
//! falls back to a default when unset:
//!
//! | variable | default |
//! |---|---|
//! | `NODA_MAX_CONNECTIONS` | 10 |
//! | `NODA_STATEMENT_TIMEOUT_MS` | 5000 |
//! | `NODA_SERIALIZATION_RETRIES` | 3 |
//! | `NODA_DEFAULT_ROWS_PER_PAGE` | 10 |
//! | `NODA_TITLE_MAX_LENGTH` | 128 |
//! | `NODA_HEADLINE_MAX_LENGTH` | 64 |
//! | `NODA_DESCRIPTION_MAX_LENGTH` | 512 |
//! | `NODA_LOG` | `info,noda=debug` |

use crate::pagination::DEFAULT_ROWS_PER_PAGE;
use crate::task::domain::{FieldLimits, TaskRules};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default tracing directive used when neither `RUST_LOG` nor `NODA_LOG` is
/// set.
pub const DEFAULT_LOG_FILTER: &str = "info,noda=debug";

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing environment variable: {0}")]
    Missing(&'static str),

    /// A variable is set to a value that cannot be used.
    #[error("invalid value for {key}: {message}")]
    Invalid {
        /// Name of the variable.
        key: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodaConfig {
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// Maximum size of the connection pool.
    pub max_connections: u32,
    /// Upper bound applied to every statement of a write transaction.
    pub statement_timeout: Duration,
    /// How many times a serialisation failure is retried before surfacing.
    pub serialization_retries: u32,
    /// Page size substituted for non-positive requests.
    pub default_rows_per_page: i64,
    /// Free-text field limits.
    pub field_limits: FieldLimits,
    /// Default tracing directive.
    pub log_filter: String,
}

impl NodaConfig {
    /// Loads configuration from the environment, reading a `.env` file
    /// first when one is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `DATABASE_URL` is unset and
    /// [`ConfigError::Invalid`] when a value fails to parse or is out of
    /// range.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            tracing::debug!(error = %err, "no .env file loaded");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections = parsed(&lookup, "NODA_MAX_CONNECTIONS", 10_u32)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "NODA_MAX_CONNECTIONS",
                message: "must be at least 1".to_owned(),
            });
        }

        let timeout_ms = parsed(&lookup, "NODA_STATEMENT_TIMEOUT_MS", 5_000_u64)?;
        let serialization_retries = parsed(&lookup, "NODA_SERIALIZATION_RETRIES", 3_u32)?;

        let default_rows_per_page =
            parsed(&lookup, "NODA_DEFAULT_ROWS_PER_PAGE", DEFAULT_ROWS_PER_PAGE)?;
        if default_rows_per_page < 1 {
            return Err(ConfigError::Invalid {
                key: "NODA_DEFAULT_ROWS_PER_PAGE",
                message: "must be at least 1".to_owned(),
            });
        }

        let defaults = FieldLimits::default();
        let field_limits = FieldLimits {
            title: parsed(&lookup, "NODA_TITLE_MAX_LENGTH", defaults.title)?,
            headline: parsed(&lookup, "NODA_HEADLINE_MAX_LENGTH", defaults.headline)?,
            description: parsed(&lookup, "NODA_DESCRIPTION_MAX_LENGTH", defaults.description)?,
        };

        let log_filter = lookup("NODA_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned());

        Ok(Self {
            database_url,
            max_connections,
            statement_timeout: Duration::from_millis(timeout_ms),
            serialization_retries,
            default_rows_per_page,
            field_limits,
            log_filter,
        })
    }

    /// Builds the payload rules described by this configuration.
    #[must_use]
    pub fn task_rules(&self) -> TaskRules {
        TaskRules::new(self.field_limits)
    }
}

fn parsed<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
            key,
            message: err.to_string(),
        })
    })
}
