//! In-memory ownership directory for tests and embedding.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use crate::task::{
    domain::{ListId, OwnerId},
    ports::{DirectoryError, DirectoryResult, OwnershipDirectory, SpecialLists},
};

/// Thread-safe in-memory registry of users, lists and materialised lists.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOwnershipDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: HashSet<OwnerId>,
    lists: HashMap<ListId, OwnerId>,
    special: HashMap<OwnerId, SpecialLists>,
}

impl InMemoryOwnershipDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Persistence`] when the lock is poisoned.
    pub fn register_user(&self, owner_id: OwnerId) -> DirectoryResult<()> {
        self.write_with(|state| {
            state.users.insert(owner_id);
        })
    }

    /// Registers a list owned by `owner_id`, registering the user as well.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Persistence`] when the lock is poisoned.
    pub fn register_list(&self, owner_id: OwnerId, list_id: ListId) -> DirectoryResult<()> {
        self.write_with(|state| {
            state.users.insert(owner_id);
            state.lists.insert(list_id, owner_id);
        })
    }

    /// Provisions fresh today and deferred lists for the owner and returns
    /// them.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Persistence`] when the lock is poisoned.
    pub fn provision_special_lists(&self, owner_id: OwnerId) -> DirectoryResult<SpecialLists> {
        let special = SpecialLists {
            today: ListId::new(),
            deferred: ListId::new(),
        };
        self.write_with(|state| {
            state.users.insert(owner_id);
            state.lists.insert(special.today, owner_id);
            state.lists.insert(special.deferred, owner_id);
            state.special.insert(owner_id, special);
        })?;
        Ok(special)
    }

    fn read(&self) -> DirectoryResult<RwLockReadGuard<'_, DirectoryState>> {
        self.state
            .read()
            .map_err(|err| DirectoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write_with(&self, f: impl FnOnce(&mut DirectoryState)) -> DirectoryResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| DirectoryError::persistence(std::io::Error::other(err.to_string())))?;
        f(&mut state);
        Ok(())
    }
}

#[async_trait]
impl OwnershipDirectory for InMemoryOwnershipDirectory {
    async fn user_exists(&self, owner_id: OwnerId) -> DirectoryResult<bool> {
        Ok(self.read()?.users.contains(&owner_id))
    }

    async fn list_belongs_to(&self, owner_id: OwnerId, list_id: ListId) -> DirectoryResult<bool> {
        Ok(self.read()?.lists.get(&list_id) == Some(&owner_id))
    }

    async fn special_lists(&self, owner_id: OwnerId) -> DirectoryResult<Option<SpecialLists>> {
        Ok(self.read()?.special.get(&owner_id).copied())
    }
}
