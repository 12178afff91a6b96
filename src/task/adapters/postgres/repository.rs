//! `PostgreSQL` repository implementation for task storage.

use super::{
    models::{NewTaskRow, TaskAttributesChangeset, TaskRow, position_column},
    query::load_page,
    schema::tasks,
    transaction::{
        TransactionSettings, TxError, load_index, lock_lists, store_failure, write_changes,
        write_transaction,
    },
};
use crate::task::{
    domain::{ListId, OwnerId, Task, TaskChange, TaskId, TaskQuery},
    ports::{Relocation, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
    settings: TransactionSettings,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool with
    /// default transaction settings.
    #[must_use]
    pub fn new(pool: TaskPgPool) -> Self {
        Self::with_settings(pool, TransactionSettings::default())
    }

    /// Creates a new repository with explicit transaction settings.
    #[must_use]
    pub const fn with_settings(pool: TaskPgPool, settings: TransactionSettings) -> Self {
        Self { pool, settings }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(|err| {
                tracing::error!(error = %err, "task store connection unavailable");
                TaskRepositoryError::persistence(err)
            })?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

/// List membership and schedule of a task as seen inside a transaction.
struct Placement {
    list_id: ListId,
    due_date: Option<DateTime<Utc>>,
    trashed_at: Option<DateTime<Utc>>,
}

fn read_placement(
    connection: &mut PgConnection,
    owner_id: OwnerId,
    task_id: TaskId,
) -> Result<Option<Placement>, DieselError> {
    let row: Option<(uuid::Uuid, Option<DateTime<Utc>>, Option<DateTime<Utc>>)> = tasks::table
        .filter(tasks::id.eq(task_id.into_inner()))
        .filter(tasks::owner_id.eq(owner_id.into_inner()))
        .select((tasks::list_id, tasks::due_date, tasks::trashed_at))
        .first(connection)
        .optional()?;
    Ok(row.map(|(list_id, due_date, trashed_at)| Placement {
        list_id: ListId::from_uuid(list_id),
        due_date,
        trashed_at,
    }))
}

/// Lifecycle of a scoped task as seen under its row lock.
enum Presence {
    Missing,
    Active,
    Trashed,
}

fn lock_presence(
    connection: &mut PgConnection,
    owner_id: OwnerId,
    list_id: ListId,
    task_id: TaskId,
) -> Result<Presence, DieselError> {
    let trashed_at: Option<Option<DateTime<Utc>>> = tasks::table
        .filter(tasks::id.eq(task_id.into_inner()))
        .filter(tasks::owner_id.eq(owner_id.into_inner()))
        .filter(tasks::list_id.eq(list_id.into_inner()))
        .select(tasks::trashed_at)
        .for_update()
        .first(connection)
        .optional()?;
    Ok(match trashed_at {
        None => Presence::Missing,
        Some(None) => Presence::Active,
        Some(Some(_)) => Presence::Trashed,
    })
}

fn touch(
    connection: &mut PgConnection,
    task_id: TaskId,
    at: DateTime<Utc>,
) -> Result<(), DieselError> {
    diesel::update(tasks::table.filter(tasks::id.eq(task_id.into_inner())))
        .set(tasks::updated_at.eq(at))
        .execute(connection)?;
    Ok(())
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn insert(&self, task: &Task) -> TaskRepositoryResult<Task> {
        let pending = task.clone();
        let settings = self.settings;

        self.run_blocking(move |connection| {
            let owner_id = pending.owner_id();
            let list_id = pending.list_id();
            write_transaction(connection, settings, list_id, |tx| {
                lock_lists(tx, owner_id, &[list_id])?;
                let slot = load_index(tx, owner_id, list_id)?.append_slot();
                let row = NewTaskRow::from_task(&pending, slot)?;

                diesel::insert_into(tasks::table)
                    .values(&row)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            TxError::Repository(TaskRepositoryError::DuplicateTask(pending.id()))
                        }
                        other => TxError::Diesel(other),
                    })?;

                let mut stored = pending.clone();
                stored.place(list_id, slot);
                Ok(stored)
            })
        })
        .await
    }

    async fn find(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(task_id.into_inner()))
                .filter(tasks::owner_id.eq(owner_id.into_inner()))
                .filter(tasks::list_id.eq(list_id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(store_failure)?;
            row.map(Task::try_from).transpose()
        })
        .await
    }

    async fn find_owned(
        &self,
        owner_id: OwnerId,
        task_id: TaskId,
    ) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(task_id.into_inner()))
                .filter(tasks::owner_id.eq(owner_id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(store_failure)?;
            row.map(Task::try_from).transpose()
        })
        .await
    }

    async fn fetch(&self, owner_id: OwnerId, query: &TaskQuery) -> TaskRepositoryResult<Vec<Task>> {
        let owned_query = query.clone();
        self.run_blocking(move |connection| {
            load_page(connection, owner_id, &owned_query)
                .map_err(store_failure)?
                .into_iter()
                .map(Task::try_from)
                .collect()
        })
        .await
    }

    async fn modify(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        change: &TaskChange,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let settings = self.settings;
        let pending = change.clone();
        self.run_blocking(move |connection| {
            write_transaction(connection, settings, list_id, |tx| {
                let row = tasks::table
                    .filter(tasks::id.eq(task_id.into_inner()))
                    .filter(tasks::owner_id.eq(owner_id.into_inner()))
                    .filter(tasks::list_id.eq(list_id.into_inner()))
                    .select(TaskRow::as_select())
                    .for_update()
                    .first::<TaskRow>(tx)
                    .optional()?
                    .ok_or(TaskRepositoryError::NotFound(task_id))?;

                let mut task = Task::try_from(row)?;
                if !task.apply_change(&pending, at) {
                    return Ok(false);
                }
                diesel::update(tasks::table.filter(tasks::id.eq(task_id.into_inner())))
                    .set(&TaskAttributesChangeset::from(&task))
                    .execute(tx)?;
                Ok(true)
            })
        })
        .await
    }

    async fn reorder(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        position: u64,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let settings = self.settings;
        self.run_blocking(move |connection| {
            write_transaction(connection, settings, list_id, |tx| {
                lock_lists(tx, owner_id, &[list_id])?;
                let before = load_index(tx, owner_id, list_id)?;
                let mut after = before.clone();
                after
                    .reorder(task_id, position)
                    .ok_or(TaskRepositoryError::NotFound(task_id))?;

                if after == before {
                    return Ok(false);
                }
                write_changes(tx, list_id, &before, &after)?;
                touch(tx, task_id, at)?;
                Ok(true)
            })
        })
        .await
    }

    async fn trash(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let settings = self.settings;
        self.run_blocking(move |connection| {
            write_transaction(connection, settings, list_id, |tx| {
                lock_lists(tx, owner_id, &[list_id])?;
                match lock_presence(tx, owner_id, list_id, task_id)? {
                    Presence::Missing => Err(TaskRepositoryError::NotFound(task_id).into()),
                    Presence::Trashed => Ok(false),
                    Presence::Active => {
                        diesel::update(tasks::table.filter(tasks::id.eq(task_id.into_inner())))
                            .set((tasks::trashed_at.eq(Some(at)), tasks::updated_at.eq(at)))
                            .execute(tx)?;
                        Ok(true)
                    }
                }
            })
        })
        .await
    }

    async fn restore(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let settings = self.settings;
        self.run_blocking(move |connection| {
            write_transaction(connection, settings, list_id, |tx| {
                lock_lists(tx, owner_id, &[list_id])?;
                match lock_presence(tx, owner_id, list_id, task_id)? {
                    Presence::Missing => Err(TaskRepositoryError::NotFound(task_id).into()),
                    Presence::Active => Ok(false),
                    Presence::Trashed => {
                        let slot = load_index(tx, owner_id, list_id)?.append_slot();
                        diesel::update(tasks::table.filter(tasks::id.eq(task_id.into_inner())))
                            .set((
                                tasks::trashed_at.eq(None::<DateTime<Utc>>),
                                tasks::position_in_list.eq(position_column(slot)?),
                                tasks::updated_at.eq(at),
                            ))
                            .execute(tx)?;
                        Ok(true)
                    }
                }
            })
        })
        .await
    }

    async fn relocate(
        &self,
        owner_id: OwnerId,
        task_id: TaskId,
        relocation: Relocation,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let settings = self.settings;
        let target = relocation.target;
        self.run_blocking(move |connection| {
            write_transaction(connection, settings, target, |tx| {
                let observed = read_placement(tx, owner_id, task_id)?
                    .ok_or(TaskRepositoryError::NotFound(task_id))?;
                lock_lists(tx, owner_id, &[observed.list_id, target])?;

                // Every writer of list_id holds the source list lock, so a
                // mismatch here means a concurrent move committed first.
                let current = read_placement(tx, owner_id, task_id)?
                    .ok_or(TaskRepositoryError::NotFound(task_id))?;
                if current.list_id != observed.list_id {
                    tracing::warn!(task_id = %task_id, "task moved concurrently");
                    return Err(TaskRepositoryError::PositionConflict(target).into());
                }
                if current.trashed_at.is_some() {
                    return Err(TaskRepositoryError::NotFound(task_id).into());
                }

                let due_date = relocation.due_date.apply(current.due_date);
                let moves = current.list_id != target;
                if !moves && due_date == current.due_date {
                    return Ok(false);
                }

                if moves {
                    let source_before = load_index(tx, owner_id, current.list_id)?;
                    let mut source_after = source_before.clone();
                    source_after.remove(task_id);
                    write_changes(tx, current.list_id, &source_before, &source_after)?;

                    let slot = load_index(tx, owner_id, target)?.append_slot();
                    diesel::update(tasks::table.filter(tasks::id.eq(task_id.into_inner())))
                        .set((
                            tasks::list_id.eq(target.into_inner()),
                            tasks::position_in_list.eq(position_column(slot)?),
                        ))
                        .execute(tx)?;
                }

                diesel::update(tasks::table.filter(tasks::id.eq(task_id.into_inner())))
                    .set((tasks::due_date.eq(due_date), tasks::updated_at.eq(at)))
                    .execute(tx)?;
                Ok(true)
            })
        })
        .await
    }

    async fn delete(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskRepositoryResult<()> {
        let settings = self.settings;
        self.run_blocking(move |connection| {
            write_transaction(connection, settings, list_id, |tx| {
                lock_lists(tx, owner_id, &[list_id])?;
                if matches!(
                    lock_presence(tx, owner_id, list_id, task_id)?,
                    Presence::Missing
                ) {
                    return Err(TaskRepositoryError::NotFound(task_id).into());
                }

                let before = load_index(tx, owner_id, list_id)?;
                diesel::delete(tasks::table.filter(tasks::id.eq(task_id.into_inner())))
                    .execute(tx)?;
                let mut after = before.clone();
                after.remove(task_id);
                write_changes(tx, list_id, &before, &after)?;
                Ok(())
            })
        })
        .await
    }
}
