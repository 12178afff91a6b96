//! Diesel row models for task persistence.

use super::schema::tasks;
use crate::task::{
    domain::{
        Completion, ListId, OwnerId, PersistedTaskData, Task, TaskId, TaskLifecycle,
        TaskPriority, TaskStatus,
    },
    ports::{TaskRepositoryError, TaskRepositoryResult},
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub owner_id: uuid::Uuid,
    /// Containing list.
    pub list_id: uuid::Uuid,
    /// Position among the active tasks of the list.
    pub position_in_list: i64,
    /// Title.
    pub title: String,
    /// Headline.
    pub headline: String,
    /// Description.
    pub description: String,
    /// Priority rank.
    pub priority: i16,
    /// Completion status.
    pub status: String,
    /// Pin flag.
    pub is_pinned: bool,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Optional reminder instant.
    pub remind_at: Option<DateTime<Utc>>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Trash timestamp.
    pub trashed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub owner_id: uuid::Uuid,
    /// Containing list.
    pub list_id: uuid::Uuid,
    /// Assigned append slot.
    pub position_in_list: i64,
    /// Title.
    pub title: String,
    /// Headline.
    pub headline: String,
    /// Description.
    pub description: String,
    /// Priority rank.
    pub priority: i16,
    /// Completion status.
    pub status: String,
    /// Pin flag.
    pub is_pinned: bool,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Optional reminder instant.
    pub remind_at: Option<DateTime<Utc>>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Trash timestamp.
    pub trashed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Attribute columns written by `TaskRepository::modify`.
///
/// `treat_none_as_null` makes clearing a due date or reminder persist.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskAttributesChangeset {
    /// Title.
    pub title: String,
    /// Headline.
    pub headline: String,
    /// Description.
    pub description: String,
    /// Priority rank.
    pub priority: i16,
    /// Completion status.
    pub status: String,
    /// Pin flag.
    pub is_pinned: bool,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Optional reminder instant.
    pub remind_at: Option<DateTime<Utc>>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Error raised when a stored row violates a task invariant.
#[derive(Debug, Clone, thiserror::Error)]
#[error("task row {0} is marked complete without a completion timestamp")]
pub struct InconsistentTaskRow(pub uuid::Uuid);

/// Converts a position into its column value.
pub fn position_column(position: u64) -> TaskRepositoryResult<i64> {
    i64::try_from(position).map_err(TaskRepositoryError::persistence)
}

impl NewTaskRow {
    /// Builds an insert row for a task placed at `position`.
    pub fn from_task(task: &Task, position: u64) -> TaskRepositoryResult<Self> {
        Ok(Self {
            id: task.id().into_inner(),
            owner_id: task.owner_id().into_inner(),
            list_id: task.list_id().into_inner(),
            position_in_list: position_column(position)?,
            title: task.title().to_owned(),
            headline: task.headline().to_owned(),
            description: task.description().to_owned(),
            priority: task.priority().rank(),
            status: task.status().as_str().to_owned(),
            is_pinned: task.is_pinned(),
            due_date: task.due_date(),
            remind_at: task.remind_at(),
            completed_at: task.completed_at(),
            trashed_at: task.trashed_at(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        })
    }
}

impl From<&Task> for TaskAttributesChangeset {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title().to_owned(),
            headline: task.headline().to_owned(),
            description: task.description().to_owned(),
            priority: task.priority().rank(),
            status: task.status().as_str().to_owned(),
            is_pinned: task.is_pinned(),
            due_date: task.due_date(),
            remind_at: task.remind_at(),
            completed_at: task.completed_at(),
            updated_at: task.updated_at(),
        }
    }
}

impl TryFrom<TaskRow> for Task {
    type Error = TaskRepositoryError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let TaskRow {
            id,
            owner_id,
            list_id,
            position_in_list,
            title,
            headline,
            description,
            priority,
            status,
            is_pinned,
            due_date,
            remind_at,
            completed_at,
            trashed_at,
            created_at,
            updated_at,
        } = row;

        let position = u64::try_from(position_in_list).map_err(TaskRepositoryError::persistence)?;
        let priority = TaskPriority::try_from(priority).map_err(TaskRepositoryError::persistence)?;
        let completion =
            match TaskStatus::try_from(status.as_str()).map_err(TaskRepositoryError::persistence)? {
                TaskStatus::Incomplete => Completion::Incomplete,
                TaskStatus::Complete => Completion::Complete {
                    at: completed_at
                        .ok_or_else(|| TaskRepositoryError::persistence(InconsistentTaskRow(id)))?,
                },
            };

        Ok(Self::from_persisted(PersistedTaskData {
            id: TaskId::from_uuid(id),
            owner_id: OwnerId::from_uuid(owner_id),
            list_id: ListId::from_uuid(list_id),
            position,
            title,
            headline,
            description,
            priority,
            completion,
            is_pinned,
            due_date,
            remind_at,
            lifecycle: TaskLifecycle::from_trashed_at(trashed_at),
            created_at,
            updated_at,
        }))
    }
}
