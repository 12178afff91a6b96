//! Caller-supplied payloads for task creation and content updates.

use super::{TaskPriority, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload for creating a task.
///
/// The service trims, bounds and defaults the payload in place, so callers
/// observe the normalised values after a save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCreation {
    /// Task title.
    pub title: String,
    /// Short headline.
    pub headline: String,
    /// Long description.
    pub description: String,
    /// Requested priority; defaults to medium.
    pub priority: Option<TaskPriority>,
    /// Requested status; defaults to incomplete.
    pub status: Option<TaskStatus>,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Optional reminder instant.
    pub remind_at: Option<DateTime<Utc>>,
}

impl TaskCreation {
    /// Creates a payload with the given title and every other field unset.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the headline.
    #[must_use]
    pub fn with_headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = headline.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the reminder instant.
    #[must_use]
    pub const fn with_remind_at(mut self, remind_at: DateTime<Utc>) -> Self {
        self.remind_at = Some(remind_at);
        self
    }
}

/// Payload for editing the free-text content of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    /// New title.
    pub title: String,
    /// New headline.
    pub headline: String,
    /// New description.
    pub description: String,
}

impl TaskUpdate {
    /// Creates an update payload.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        headline: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            headline: headline.into(),
            description: description.into(),
        }
    }
}
