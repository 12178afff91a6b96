//! Shared test helpers for `PostgreSQL` integration tests.

use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types;
use mockable::DefaultClock;
use noda::config::NodaConfig;
use noda::pagination::Pagination;
use noda::task::{
    adapters::postgres::{
        DEFERRED_KIND, PostgresOwnershipDirectory, PostgresTaskRepository, TODAY_KIND, TaskPgPool,
        connect,
    },
    domain::{ListId, OwnerId, Task, TaskCreation, TaskId},
    ports::SpecialLists,
    services::TaskService,
};
use rstest::fixture;
use uuid::Uuid;

/// Boxed error used by `PostgreSQL` test setup.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Environment variable naming the server used by these tests.
pub const TEST_DATABASE_URL_VAR: &str = "NODA_TEST_DATABASE_URL";

/// SQL creating the task tables.
pub const CREATE_TASK_TABLES_SQL: &str =
    include_str!("../../migrations/2026-01-01-000000_create_task_tables/up.sql");

/// Service type wired to the `PostgreSQL` adapters.
pub type PgService = TaskService<PostgresTaskRepository, PostgresOwnershipDirectory, DefaultClock>;

/// Database created for one test and dropped afterwards.
pub struct TemporaryDatabase {
    admin_url: String,
    name: String,
    url: String,
}

impl TemporaryDatabase {
    /// Creates a fresh database next to the one named by `admin_url` and
    /// applies the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or migrated.
    pub fn create(admin_url: &str) -> Result<Self, BoxError> {
        let name = format!("noda_test_{}", Uuid::new_v4().simple());
        let mut admin = PgConnection::establish(admin_url)?;
        admin.batch_execute(&format!("CREATE DATABASE \"{name}\""))?;

        let url = sibling_url(admin_url, &name);
        let database = Self {
            admin_url: admin_url.to_owned(),
            name,
            url,
        };
        PgConnection::establish(&database.url)?.batch_execute(CREATE_TASK_TABLES_SQL)?;
        Ok(database)
    }

    /// Connection URL of the temporary database.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for TemporaryDatabase {
    fn drop(&mut self) {
        let dropped = PgConnection::establish(&self.admin_url)
            .map_err(BoxError::from)
            .and_then(|mut admin| {
                admin
                    .batch_execute(&format!(
                        "DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)",
                        self.name
                    ))
                    .map_err(BoxError::from)
            });
        if let Err(err) = dropped {
            tracing::warn!(database = %self.name, error = %err, "failed to drop test database");
        }
    }
}

/// Replaces the database segment of a connection URL.
fn sibling_url(url: &str, database: &str) -> String {
    let (base, query) = url.split_once('?').map_or((url, None), |(b, q)| (b, Some(q)));
    let prefix = base.rsplit_once('/').map_or(base, |(head, _)| head);
    query.map_or_else(
        || format!("{prefix}/{database}"),
        |params| format!("{prefix}/{database}?{params}"),
    )
}

/// Seeded service over a temporary database.
pub struct PgContext {
    pub service: PgService,
    pub repository: Arc<PostgresTaskRepository>,
    pub pool: TaskPgPool,
    pub owner_id: OwnerId,
    pub list_id: ListId,
    _database: TemporaryDatabase,
}

impl PgContext {
    /// Registers another regular list for the context owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn new_list(&self) -> Result<ListId, BoxError> {
        let list_id = ListId::new();
        insert_list(&mut *self.pool.get()?, self.owner_id, list_id, "regular")?;
        Ok(list_id)
    }

    /// Materialises the owner's today and deferred lists.
    ///
    /// # Errors
    ///
    /// Returns an error if the inserts fail.
    pub fn provision_special_lists(&self) -> Result<SpecialLists, BoxError> {
        let special = SpecialLists {
            today: ListId::new(),
            deferred: ListId::new(),
        };
        let mut connection = self.pool.get()?;
        insert_list(&mut connection, self.owner_id, special.today, TODAY_KIND)?;
        insert_list(&mut connection, self.owner_id, special.deferred, DEFERRED_KIND)?;
        Ok(special)
    }

    /// Saves a task with the given title into `list_id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the save fails.
    pub async fn save(&self, list_id: ListId, title: &str) -> Result<TaskId, BoxError> {
        let id = self
            .service
            .save(self.owner_id, list_id, &mut TaskCreation::titled(title))
            .await?;
        Ok(id)
    }

    /// Reads the active tasks of a list in manual order.
    ///
    /// # Errors
    ///
    /// Returns an error when the read fails.
    pub async fn ordered(&self, list_id: ListId) -> Result<Vec<Task>, BoxError> {
        let page = self
            .service
            .fetch(
                self.owner_id,
                list_id,
                Pagination::new(1, 100),
                "",
                "position",
            )
            .await?;
        Ok(page.payload)
    }

    /// Reads `(title, position)` pairs of a list in manual order.
    ///
    /// # Errors
    ///
    /// Returns an error when the read fails.
    pub async fn layout(&self, list_id: ListId) -> Result<Vec<(String, u64)>, BoxError> {
        Ok(self
            .ordered(list_id)
            .await?
            .iter()
            .map(|task| (task.title().to_owned(), task.position()))
            .collect())
    }
}

fn insert_list(
    connection: &mut PgConnection,
    owner_id: OwnerId,
    list_id: ListId,
    kind: &str,
) -> QueryResult<usize> {
    diesel::sql_query("INSERT INTO lists (id, owner_id, kind) VALUES ($1, $2, $3)")
        .bind::<sql_types::Uuid, _>(list_id.into_inner())
        .bind::<sql_types::Uuid, _>(owner_id.into_inner())
        .bind::<sql_types::Text, _>(kind)
        .execute(connection)
}

/// Builds expected `(title, position)` pairs for a dense layout.
#[must_use]
pub fn dense(titles: &[&str]) -> Vec<(String, u64)> {
    titles
        .iter()
        .zip(0_u64..)
        .map(|(title, position)| ((*title).to_owned(), position))
        .collect()
}

/// Provides a seeded context, or `None` when no test server is configured.
///
/// # Errors
///
/// Returns an error if database setup fails.
#[fixture]
pub fn pg_context() -> Result<Option<PgContext>, BoxError> {
    let Ok(admin_url) = std::env::var(TEST_DATABASE_URL_VAR) else {
        return Ok(None);
    };
    let database = TemporaryDatabase::create(&admin_url)?;
    let url = database.url().to_owned();
    let config = NodaConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some(url.clone()),
        "NODA_MAX_CONNECTIONS" => Some("4".to_owned()),
        _ => None,
    })?;
    let pool = connect(&config)?;

    let owner_id = OwnerId::new();
    let list_id = ListId::new();
    let mut connection = pool.get()?;
    diesel::sql_query("INSERT INTO users (id) VALUES ($1)")
        .bind::<sql_types::Uuid, _>(owner_id.into_inner())
        .execute(&mut connection)?;
    insert_list(&mut connection, owner_id, list_id, "regular")?;
    drop(connection);

    let repository = Arc::new(PostgresTaskRepository::with_settings(
        pool.clone(),
        (&config).into(),
    ));
    let service = TaskService::new(
        Arc::clone(&repository),
        Arc::new(PostgresOwnershipDirectory::new(pool.clone())),
        Arc::new(DefaultClock),
    )
    .configured(&config);
    Ok(Some(PgContext {
        service,
        repository,
        pool,
        owner_id,
        list_id,
        _database: database,
    }))
}
