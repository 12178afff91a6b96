//! Service-level error taxonomy.

use crate::task::{
    domain::{ListId, OwnerId, ParseIdError, TaskDomainError, TaskId},
    ports::{DirectoryError, TaskRepositoryError},
};
use std::fmt;
use thiserror::Error;

/// Entity a scoped lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingEntity {
    /// Task absent for the owner (and list, when scoped by one).
    Task(TaskId),
    /// List absent or owned by someone else.
    List(ListId),
    /// Unknown user.
    User(OwnerId),
    /// Owner without materialised today and deferred lists.
    SpecialLists(OwnerId),
}

impl fmt::Display for MissingEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(id) => write!(f, "task {id}"),
            Self::List(id) => write!(f, "list {id}"),
            Self::User(id) => write!(f, "user {id}"),
            Self::SpecialLists(id) => write!(f, "today and deferred lists of user {id}"),
        }
    }
}

/// Errors returned by [`super::TaskService`].
#[derive(Debug, Clone, Error)]
pub enum TaskServiceError {
    /// A required identifier was nil. Always a caller bug.
    #[error("parameter \"{parameter}\" on function \"{operation}\" cannot be nil")]
    NilParameter {
        /// Operation that rejected the call.
        operation: &'static str,
        /// Offending parameter.
        parameter: &'static str,
    },

    /// Payload validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// A scoped lookup found nothing.
    #[error("{0} not found")]
    NotFound(MissingEntity),

    /// Text could not be parsed into an identifier.
    #[error(transparent)]
    InvalidIdentifier(#[from] ParseIdError),

    /// Task repository failure, propagated unchanged.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),

    /// Ownership lookup failure, propagated unchanged.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl TaskServiceError {
    /// Returns `true` for lookup misses raised by the service or reported by
    /// the repository.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Repository(TaskRepositoryError::NotFound(_))
        )
    }
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;
