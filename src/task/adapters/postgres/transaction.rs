//! Transaction, locking and retry helpers for structural task writes.
//!
//! Every structural write runs inside one transaction that bounds its
//! statements with `statement_timeout`, takes a transaction-scoped advisory
//! lock per affected `(owner, list)` pair and locks the list's active rows
//! before reading positions.

use super::schema::tasks;
use crate::task::{
    domain::{ListId, OwnerId, PositionIndex, Slot, TaskId},
    ports::{TaskRepositoryError, TaskRepositoryResult},
};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use std::time::Duration;

/// Name of the deferrable exclusion constraint keeping active positions
/// unique per list.
pub const ACTIVE_POSITION_CONSTRAINT: &str = "tasks_active_position_unique";

/// Retry and timeout settings applied to write transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSettings {
    /// Upper bound applied to every statement.
    pub statement_timeout: Duration,
    /// Number of retries after a serialisation failure.
    pub serialization_retries: u32,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            statement_timeout: Duration::from_secs(5),
            serialization_retries: 3,
        }
    }
}

/// Error type used inside write transactions.
///
/// Diesel errors stay raw until the transaction settles so that
/// serialisation failures can be retried and constraint names inspected.
#[derive(Debug)]
pub enum TxError {
    /// Database error raised by Diesel.
    Diesel(DieselError),
    /// Domain-level outcome decided inside the transaction.
    Repository(TaskRepositoryError),
}

impl From<DieselError> for TxError {
    fn from(err: DieselError) -> Self {
        Self::Diesel(err)
    }
}

impl From<TaskRepositoryError> for TxError {
    fn from(err: TaskRepositoryError) -> Self {
        Self::Repository(err)
    }
}

impl TxError {
    const fn is_serialization_failure(&self) -> bool {
        matches!(
            self,
            Self::Diesel(DieselError::DatabaseError(
                DatabaseErrorKind::SerializationFailure,
                _
            ))
        )
    }

    /// Settles the error into the repository taxonomy, logging store
    /// failures once.
    fn settle(self, conflict_list: ListId) -> TaskRepositoryError {
        match self {
            Self::Repository(err) => err,
            Self::Diesel(DieselError::DatabaseError(_, ref info))
                if is_active_position_violation(info.as_ref()) =>
            {
                tracing::warn!(list_id = %conflict_list, "active position conflict");
                TaskRepositoryError::PositionConflict(conflict_list)
            }
            Self::Diesel(err) => store_failure(err),
        }
    }
}

/// Wraps a Diesel error raised outside a write transaction, logging it.
#[must_use]
pub fn store_failure(err: DieselError) -> TaskRepositoryError {
    tracing::error!(error = %err, "task store failure");
    TaskRepositoryError::persistence(err)
}

fn is_active_position_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == ACTIVE_POSITION_CONSTRAINT)
}

/// Runs `work` in a transaction, retrying serialisation failures.
///
/// `conflict_list` names the list reported when the commit trips the
/// active position constraint.
pub fn write_transaction<T, F>(
    connection: &mut PgConnection,
    settings: TransactionSettings,
    conflict_list: ListId,
    mut work: F,
) -> TaskRepositoryResult<T>
where
    F: FnMut(&mut PgConnection) -> Result<T, TxError>,
{
    let mut attempt = 0_u32;
    loop {
        let outcome = connection.transaction::<T, TxError, _>(|tx| {
            set_statement_timeout(tx, settings.statement_timeout)?;
            work(tx)
        });
        match outcome {
            Err(err) if err.is_serialization_failure() && attempt < settings.serialization_retries => {
                attempt = attempt.saturating_add(1);
                tracing::debug!(attempt, "retrying task transaction after serialization failure");
            }
            other => return other.map_err(|err| err.settle(conflict_list)),
        }
    }
}

fn set_statement_timeout(
    connection: &mut PgConnection,
    timeout: Duration,
) -> Result<(), DieselError> {
    let millis = timeout.as_millis();
    diesel::sql_query(format!("SET LOCAL statement_timeout = {millis}")).execute(connection)?;
    Ok(())
}

/// Takes the advisory locks of the given lists in a fixed order.
pub fn lock_lists(
    connection: &mut PgConnection,
    owner_id: OwnerId,
    list_ids: &[ListId],
) -> Result<(), DieselError> {
    let mut ordered = list_ids.to_vec();
    ordered.sort_unstable();
    ordered.dedup();
    for list_id in ordered {
        diesel::sql_query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind::<diesel::sql_types::Text, _>(format!("{owner_id}:{list_id}"))
            .execute(connection)?;
    }
    Ok(())
}

/// Locks the active rows of a list and returns their positions.
pub fn load_index(
    connection: &mut PgConnection,
    owner_id: OwnerId,
    list_id: ListId,
) -> Result<PositionIndex, TxError> {
    let rows: Vec<(uuid::Uuid, i64)> = tasks::table
        .filter(tasks::owner_id.eq(owner_id.into_inner()))
        .filter(tasks::list_id.eq(list_id.into_inner()))
        .filter(tasks::trashed_at.is_null())
        .select((tasks::id, tasks::position_in_list))
        .for_update()
        .load(connection)?;

    let slots = rows
        .into_iter()
        .map(|(id, position)| {
            u64::try_from(position)
                .map(|value| Slot::new(TaskId::from_uuid(id), value))
                .map_err(|err| TxError::Repository(TaskRepositoryError::persistence(err)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PositionIndex::from_slots(slots))
}

/// Writes the slots of `after` that differ from `before`.
pub fn write_changes(
    connection: &mut PgConnection,
    list_id: ListId,
    before: &PositionIndex,
    after: &PositionIndex,
) -> Result<(), TxError> {
    for slot in after.changes_from(before) {
        let position = i64::try_from(slot.position)
            .map_err(|err| TxError::Repository(TaskRepositoryError::persistence(err)))?;
        diesel::update(tasks::table.filter(tasks::id.eq(slot.task_id.into_inner())))
            .set((
                tasks::list_id.eq(list_id.into_inner()),
                tasks::position_in_list.eq(position),
            ))
            .execute(connection)?;
    }
    Ok(())
}
