//! In-memory task repository for tests and embedding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{ListId, OwnerId, PositionIndex, Slot, Task, TaskChange, TaskId, TaskQuery},
    ports::{Relocation, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// A single lock guards every task, which linearises all structural
/// operations.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
}

impl InMemoryTaskState {
    fn scoped_mut(
        &mut self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskRepositoryResult<&mut Task> {
        self.tasks
            .get_mut(&task_id)
            .filter(|task| task.owner_id() == owner_id && task.list_id() == list_id)
            .ok_or(TaskRepositoryError::NotFound(task_id))
    }

    fn index_of(&self, owner_id: OwnerId, list_id: ListId) -> PositionIndex {
        PositionIndex::from_slots(
            self.tasks
                .values()
                .filter(|task| {
                    task.owner_id() == owner_id && task.list_id() == list_id && !task.is_trashed()
                })
                .map(|task| Slot::new(task.id(), task.position())),
        )
    }

    /// Writes the slots that differ from `before` back onto their tasks.
    fn apply(&mut self, list_id: ListId, before: &PositionIndex, after: &PositionIndex) {
        for slot in after.changes_from(before) {
            if let Some(task) = self.tasks.get_mut(&slot.task_id) {
                task.place(list_id, slot.position);
            }
        }
    }
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, task: &Task) -> TaskRepositoryResult<Task> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }

        let slot = state.index_of(task.owner_id(), task.list_id()).append_slot();
        let mut stored = task.clone();
        stored.place(task.list_id(), slot);
        state.tasks.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn find(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .get(&task_id)
            .filter(|task| task.owner_id() == owner_id && task.list_id() == list_id)
            .cloned())
    }

    async fn find_owned(
        &self,
        owner_id: OwnerId,
        task_id: TaskId,
    ) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .get(&task_id)
            .filter(|task| task.owner_id() == owner_id)
            .cloned())
    }

    async fn fetch(&self, owner_id: OwnerId, query: &TaskQuery) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let mut matching: Vec<&Task> = state
            .tasks
            .values()
            .filter(|task| task.owner_id() == owner_id && query.admits(task))
            .collect();
        matching.sort_by(|a, b| query.sort.compare(a, b));

        let offset = usize::try_from(query.pagination.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.pagination.limit()).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn modify(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        change: &TaskChange,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let mut state = self.write()?;
        Ok(state
            .scoped_mut(owner_id, list_id, task_id)?
            .apply_change(change, at))
    }

    async fn reorder(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        position: u64,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let mut state = self.write()?;
        let before = state.index_of(owner_id, list_id);
        let mut after = before.clone();
        after
            .reorder(task_id, position)
            .ok_or(TaskRepositoryError::NotFound(task_id))?;

        if after == before {
            return Ok(false);
        }
        state.apply(list_id, &before, &after);
        state.scoped_mut(owner_id, list_id, task_id)?.stamp(at);
        Ok(true)
    }

    async fn trash(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let mut state = self.write()?;
        Ok(state.scoped_mut(owner_id, list_id, task_id)?.trash(at))
    }

    async fn restore(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let mut state = self.write()?;
        let slot = state.index_of(owner_id, list_id).append_slot();
        Ok(state
            .scoped_mut(owner_id, list_id, task_id)?
            .restore(slot, at))
    }

    async fn relocate(
        &self,
        owner_id: OwnerId,
        task_id: TaskId,
        relocation: Relocation,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let mut state = self.write()?;
        let current = state
            .tasks
            .get(&task_id)
            .filter(|task| task.owner_id() == owner_id && !task.is_trashed())
            .ok_or(TaskRepositoryError::NotFound(task_id))?;
        let source = current.list_id();
        let due_date = relocation.due_date.apply(current.due_date());

        let moves = source != relocation.target;
        if !moves && due_date == current.due_date() {
            return Ok(false);
        }

        if moves {
            let source_before = state.index_of(owner_id, source);
            let mut source_after = source_before.clone();
            source_after.remove(task_id);
            state.apply(source, &source_before, &source_after);

            let slot = state.index_of(owner_id, relocation.target).append_slot();
            if let Some(task) = state.tasks.get_mut(&task_id) {
                task.place(relocation.target, slot);
            }
        }

        let task = state
            .tasks
            .get_mut(&task_id)
            .ok_or(TaskRepositoryError::NotFound(task_id))?;
        task.reschedule(due_date);
        task.stamp(at);
        Ok(true)
    }

    async fn delete(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state.scoped_mut(owner_id, list_id, task_id)?;

        let before = state.index_of(owner_id, list_id);
        state.tasks.remove(&task_id);
        let mut after = before.clone();
        after.remove(task_id);
        state.apply(list_id, &before, &after);
        Ok(())
    }
}
