//! Ownership lookups answered by the user and list collaborators.

use crate::task::domain::{ListId, OwnerId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for directory lookups.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Per-owner materialised lists backing the virtual views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecialLists {
    /// List whose members always appear in the today view.
    pub today: ListId,
    /// List receiving deferred tasks.
    pub deferred: ListId,
}

/// Existence and ownership checks consulted before trusting caller-supplied
/// identifiers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OwnershipDirectory: Send + Sync {
    /// Returns `true` when the user exists.
    async fn user_exists(&self, owner_id: OwnerId) -> DirectoryResult<bool>;

    /// Returns `true` when the list exists and belongs to the owner.
    async fn list_belongs_to(&self, owner_id: OwnerId, list_id: ListId) -> DirectoryResult<bool>;

    /// Returns the owner's materialised today and deferred lists, or `None`
    /// when they have not been provisioned.
    async fn special_lists(&self, owner_id: OwnerId) -> DirectoryResult<Option<SpecialLists>>;
}

/// Errors returned by directory implementations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// Lookup failed in the backing store.
    #[error("directory lookup failure")]
    Persistence(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl DirectoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
