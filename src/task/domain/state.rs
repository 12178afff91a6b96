//! Enumerated task attributes and tagged sub-states.

use super::{ParseTaskPriorityError, ParseTaskStatusError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Medium,
    /// High priority.
    High,
}

impl TaskPriority {
    /// Returns the canonical textual representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Returns the ordinal used for storage and sorting.
    #[must_use]
    pub const fn rank(self) -> i16 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = ParseTaskPriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseTaskPriorityError(value.to_owned())),
        }
    }
}

impl TryFrom<i16> for TaskPriority {
    type Error = ParseTaskPriorityError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::Medium),
            2 => Ok(Self::High),
            other => Err(ParseTaskPriorityError(other.to_string())),
        }
    }
}

/// Task completion status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Work on the task is outstanding.
    #[default]
    Incomplete,
    /// The task has been completed.
    Complete,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Complete => "complete",
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "incomplete" => Ok(Self::Incomplete),
            "complete" => Ok(Self::Complete),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Completion sub-state. The completion timestamp exists only while the
/// task is complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Completion {
    /// The task is incomplete.
    #[default]
    Incomplete,
    /// The task was completed at the given instant.
    Complete {
        /// Completion timestamp.
        at: DateTime<Utc>,
    },
}

impl Completion {
    /// Returns the status projected from this sub-state.
    #[must_use]
    pub const fn status(self) -> TaskStatus {
        match self {
            Self::Incomplete => TaskStatus::Incomplete,
            Self::Complete { .. } => TaskStatus::Complete,
        }
    }

    /// Returns the completion timestamp, if complete.
    #[must_use]
    pub const fn completed_at(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Incomplete => None,
            Self::Complete { at } => Some(at),
        }
    }

    /// Builds the sub-state for a requested status at the given instant.
    #[must_use]
    pub const fn for_status(status: TaskStatus, at: DateTime<Utc>) -> Self {
        match status {
            TaskStatus::Incomplete => Self::Incomplete,
            TaskStatus::Complete => Self::Complete { at },
        }
    }
}

/// Lifecycle sub-state. Deleted tasks no longer exist, so only the active
/// and trashed states are representable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskLifecycle {
    /// The task is listed in its list's active view.
    #[default]
    Active,
    /// The task sits in the trash view.
    Trashed {
        /// Trash timestamp.
        at: DateTime<Utc>,
    },
}

impl TaskLifecycle {
    /// Returns `true` when the task is active.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns the trash timestamp, if trashed.
    #[must_use]
    pub const fn trashed_at(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Trashed { at } => Some(at),
        }
    }

    /// Reconstructs the lifecycle from an optional trash timestamp.
    #[must_use]
    pub const fn from_trashed_at(trashed_at: Option<DateTime<Utc>>) -> Self {
        match trashed_at {
            None => Self::Active,
            Some(at) => Self::Trashed { at },
        }
    }
}
