//! Repository port for task persistence, ordering and listing.
//!
//! Every method is scoped by owner. Structural methods (`insert`, `reorder`,
//! `trash`, `restore`, `relocate`, `delete`) keep the active positions of
//! each affected list unique and are linearised per `(owner, list)` by the
//! implementation. `modify` reads and writes a task's attributes in one
//! atomic step.

use crate::task::domain::{ListId, OwnerId, Task, TaskChange, TaskId, TaskQuery};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// How a relocation treats the task's due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDateChange {
    /// Leave the due date untouched.
    Keep,
    /// Overwrite the due date.
    Set(DateTime<Utc>),
    /// Remove the due date.
    Clear,
}

impl DueDateChange {
    /// Returns the due date after applying the change to `current`.
    #[must_use]
    pub const fn apply(self, current: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        match self {
            Self::Keep => current,
            Self::Set(due) => Some(due),
            Self::Clear => None,
        }
    }
}

/// Cross-list move of an active task, optionally rescheduling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    /// List the task ends up in. When it equals the current list, only the
    /// due date change applies.
    pub target: ListId,
    /// Due date change applied in the same transaction.
    pub due_date: DueDateChange,
}

impl Relocation {
    /// Moves the task to `target` without rescheduling it.
    #[must_use]
    pub const fn to(target: ListId) -> Self {
        Self {
            target,
            due_date: DueDateChange::Keep,
        }
    }

    /// Sets the due date change.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DueDateChange) -> Self {
        self.due_date = due_date;
        self
    }
}

/// Task persistence contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new active task at the append slot of its list and returns
    /// the stored task with its assigned position.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn insert(&self, task: &Task) -> TaskRepositoryResult<Task>;

    /// Finds a task, active or trashed, by owner, list and identifier.
    ///
    /// Returns `None` when no such task exists.
    async fn find(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskRepositoryResult<Option<Task>>;

    /// Finds a task, active or trashed, by owner and identifier in any list.
    async fn find_owned(
        &self,
        owner_id: OwnerId,
        task_id: TaskId,
    ) -> TaskRepositoryResult<Option<Task>>;

    /// Returns one page of the owner's active tasks matching the query, in
    /// query order.
    async fn fetch(&self, owner_id: OwnerId, query: &TaskQuery) -> TaskRepositoryResult<Vec<Task>>;

    /// Applies an attribute change to the stored task while holding its row,
    /// so concurrent writers cannot interleave. Returns `false` when the
    /// change was a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// in the list.
    async fn modify(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        change: &TaskChange,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool>;

    /// Moves an active task to `position` within its list and repacks the
    /// list. Returns `false` when no slot changed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task is not active
    /// in the list.
    async fn reorder(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        position: u64,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool>;

    /// Moves a task to the trash without repacking its siblings. Returns
    /// `false` when the task already was trashed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn trash(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool>;

    /// Restores a trashed task at the append slot of its list. Returns
    /// `false` when the task was active.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn restore(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool>;

    /// Moves an active task into another list, repacking the source and
    /// appending to the target, and applies the due date change. Returns
    /// `false` when neither list nor due date changes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// or is trashed.
    async fn relocate(
        &self,
        owner_id: OwnerId,
        task_id: TaskId,
        relocation: Relocation,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool>;

    /// Permanently removes a task and repacks the remaining active tasks of
    /// its list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn delete(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// Two active tasks of a list would share a position.
    #[error("position conflict in list {0}")]
    PositionConflict(ListId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure. The source is kept for diagnostics and
    /// left out of the message.
    #[error("task store failure")]
    Persistence(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
