//! `PostgreSQL` adapters for task persistence.

mod directory;
mod models;
mod query;
mod repository;
mod schema;
mod transaction;

pub use directory::{DEFERRED_KIND, PostgresOwnershipDirectory, TODAY_KIND};
pub use repository::{PostgresTaskRepository, TaskPgPool};
pub use transaction::{ACTIVE_POSITION_CONSTRAINT, TransactionSettings};

use crate::config::NodaConfig;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};

/// Builds the connection pool described by the configuration.
///
/// # Errors
///
/// Returns [`PoolError`] when the pool cannot open its initial connections.
pub fn connect(config: &NodaConfig) -> Result<TaskPgPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(config.database_url.as_str());
    Pool::builder()
        .max_size(config.max_connections)
        .build(manager)
        .inspect_err(|err| tracing::error!(error = %err, "failed to build task store pool"))
}

impl From<&NodaConfig> for TransactionSettings {
    fn from(config: &NodaConfig) -> Self {
        Self {
            statement_timeout: config.statement_timeout,
            serialization_retries: config.serialization_retries,
        }
    }
}
