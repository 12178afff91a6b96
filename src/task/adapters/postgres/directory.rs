//! `PostgreSQL` ownership directory over the `users` and `lists` tables.

use super::{repository::TaskPgPool, schema::{lists, users}};
use crate::task::{
    domain::{ListId, OwnerId},
    ports::{DirectoryError, DirectoryResult, OwnershipDirectory, SpecialLists},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;

/// List kind of the materialised today list.
pub const TODAY_KIND: &str = "today";

/// List kind of the materialised deferred list.
pub const DEFERRED_KIND: &str = "deferred";

/// `PostgreSQL`-backed ownership directory.
#[derive(Debug, Clone)]
pub struct PostgresOwnershipDirectory {
    pool: TaskPgPool,
}

impl PostgresOwnershipDirectory {
    /// Creates a directory over the given pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> DirectoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(DirectoryError::persistence)?;
            f(&mut connection).map_err(|err| {
                tracing::error!(error = %err, "directory lookup failed");
                DirectoryError::persistence(err)
            })
        })
        .await
        .map_err(DirectoryError::persistence)?
    }
}

#[async_trait]
impl OwnershipDirectory for PostgresOwnershipDirectory {
    async fn user_exists(&self, owner_id: OwnerId) -> DirectoryResult<bool> {
        self.run_blocking(move |connection| {
            diesel::select(diesel::dsl::exists(
                users::table.filter(users::id.eq(owner_id.into_inner())),
            ))
            .get_result(connection)
        })
        .await
    }

    async fn list_belongs_to(&self, owner_id: OwnerId, list_id: ListId) -> DirectoryResult<bool> {
        self.run_blocking(move |connection| {
            diesel::select(diesel::dsl::exists(
                lists::table
                    .filter(lists::id.eq(list_id.into_inner()))
                    .filter(lists::owner_id.eq(owner_id.into_inner())),
            ))
            .get_result(connection)
        })
        .await
    }

    async fn special_lists(&self, owner_id: OwnerId) -> DirectoryResult<Option<SpecialLists>> {
        let rows: Vec<(uuid::Uuid, String)> = self
            .run_blocking(move |connection| {
                lists::table
                    .filter(lists::owner_id.eq(owner_id.into_inner()))
                    .filter(lists::kind.eq_any(vec![TODAY_KIND, DEFERRED_KIND]))
                    .select((lists::id, lists::kind))
                    .load(connection)
            })
            .await?;

        let find = |kind: &str| {
            rows.iter()
                .find(|(_, row_kind)| row_kind == kind)
                .map(|(id, _)| ListId::from_uuid(*id))
        };
        Ok(find(TODAY_KIND)
            .zip(find(DEFERRED_KIND))
            .map(|(today, deferred)| SpecialLists { today, deferred }))
    }
}
