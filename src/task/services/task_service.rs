//! Task commands: creation, state transitions, ordering and moves.

use super::{
    error::{MissingEntity, TaskServiceError, TaskServiceResult},
    guards::require_identifier,
};
use crate::config::NodaConfig;
use crate::pagination::DEFAULT_ROWS_PER_PAGE;
use crate::task::{
    domain::{
        DayWindow, ListId, OwnerId, Task, TaskChange, TaskCreation, TaskDomainError, TaskId,
        TaskPriority, TaskRules, TaskUpdate,
    },
    ports::{
        DueDateChange, OwnershipDirectory, Relocation, SpecialLists, TaskRepository,
        TaskRepositoryError,
    },
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;

/// Task lifecycle and ordering service.
///
/// Every operation rejects nil identifiers before touching a collaborator,
/// normalises payloads in place and scopes each lookup by owner.
pub struct TaskService<R, D, C>
where
    R: TaskRepository,
    D: OwnershipDirectory,
    C: Clock + Send + Sync,
{
    pub(super) repository: Arc<R>,
    pub(super) directory: Arc<D>,
    pub(super) clock: Arc<C>,
    pub(super) rules: TaskRules,
    pub(super) default_rows_per_page: i64,
}

impl<R, D, C> Clone for TaskService<R, D, C>
where
    R: TaskRepository,
    D: OwnershipDirectory,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            directory: Arc::clone(&self.directory),
            clock: Arc::clone(&self.clock),
            rules: self.rules.clone(),
            default_rows_per_page: self.default_rows_per_page,
        }
    }
}

impl<R, D, C> TaskService<R, D, C>
where
    R: TaskRepository,
    D: OwnershipDirectory,
    C: Clock + Send + Sync,
{
    /// Creates a service with default payload rules and page size.
    #[must_use]
    pub fn new(repository: Arc<R>, directory: Arc<D>, clock: Arc<C>) -> Self {
        Self {
            repository,
            directory,
            clock,
            rules: TaskRules::default(),
            default_rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }

    /// Applies the payload rules and page size of a configuration.
    #[must_use]
    pub fn configured(self, config: &NodaConfig) -> Self {
        self.with_rules(config.task_rules())
            .with_default_rows_per_page(config.default_rows_per_page)
    }

    /// Replaces the payload rules.
    #[must_use]
    pub fn with_rules(mut self, rules: TaskRules) -> Self {
        self.rules = rules;
        self
    }

    /// Replaces the page size used for non-positive requests.
    #[must_use]
    pub const fn with_default_rows_per_page(mut self, rows_per_page: i64) -> Self {
        self.default_rows_per_page = rows_per_page;
        self
    }

    /// Creates a task at the end of its list and returns its identifier.
    ///
    /// The payload is trimmed, bounded and defaulted in place.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NilParameter`] for nil identifiers,
    /// [`TaskServiceError::Domain`] when a field is too long (before any
    /// store access) and [`TaskServiceError::NotFound`] when the list does
    /// not belong to the owner.
    pub async fn save(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        creation: &mut TaskCreation,
    ) -> TaskServiceResult<TaskId> {
        require_identifier("Save", "ownerID", owner_id)?;
        require_identifier("Save", "listID", list_id)?;
        self.rules.normalize_creation(creation)?;
        self.ensure_list(owner_id, list_id).await?;

        let task = Task::create(owner_id, list_id, creation, &*self.clock);
        let stored = self.repository.insert(&task).await?;
        tracing::debug!(
            task_id = %stored.id(),
            list_id = %list_id,
            position = stored.position(),
            "task saved"
        );
        Ok(stored.id())
    }

    /// Copies an active task into a new task appended to the same list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the user is unknown or the
    /// source task is missing or trashed.
    pub async fn duplicate(&self, owner_id: OwnerId, task_id: TaskId) -> TaskServiceResult<TaskId> {
        require_identifier("Duplicate", "ownerID", owner_id)?;
        require_identifier("Duplicate", "taskID", task_id)?;
        self.ensure_user(owner_id).await?;

        let source = self.find_active_owned(owner_id, task_id).await?;
        let replica = source.replicate(&*self.clock);
        let stored = self.repository.insert(&replica).await?;
        tracing::debug!(source = %task_id, replica = %stored.id(), "task duplicated");
        Ok(stored.id())
    }

    /// Returns a task of the list, active or trashed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when no such task exists.
    pub async fn fetch_by_id(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskServiceResult<Task> {
        require_task_scope("FetchByID", owner_id, list_id, task_id)?;
        self.find_scoped(owner_id, list_id, task_id).await
    }

    /// Replaces title, headline and description. The payload is trimmed,
    /// bounded and defaulted in place.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Domain`] when a field is too long and
    /// [`TaskServiceError::NotFound`] when the task does not exist.
    pub async fn update(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        update: &mut TaskUpdate,
    ) -> TaskServiceResult<bool> {
        require_task_scope("Update", owner_id, list_id, task_id)?;
        self.rules.normalize_update(update)?;
        self.transition(owner_id, list_id, task_id, &TaskChange::Edit(update.clone()))
            .await
    }

    /// Moves a task to `position` within its list, clamped to the list
    /// bounds, and repacks the list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] wrapping
    /// [`crate::task::ports::TaskRepositoryError::NotFound`] when the task is
    /// not active in the list.
    pub async fn reorder(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        position: u64,
    ) -> TaskServiceResult<bool> {
        require_task_scope("Reorder", owner_id, list_id, task_id)?;
        let changed = self
            .repository
            .reorder(owner_id, list_id, task_id, position, self.clock.utc())
            .await?;
        tracing::debug!(task_id = %task_id, position, changed, "task reordered");
        Ok(changed)
    }

    /// Sets or clears the reminder.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist.
    pub async fn set_reminder(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        remind_at: Option<DateTime<Utc>>,
    ) -> TaskServiceResult<bool> {
        require_task_scope("SetReminder", owner_id, list_id, task_id)?;
        self.transition(owner_id, list_id, task_id, &TaskChange::SetReminder(remind_at))
            .await
    }

    /// Sets or clears the due date.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist.
    pub async fn set_due_date(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        due_date: Option<DateTime<Utc>>,
    ) -> TaskServiceResult<bool> {
        require_task_scope("SetDueDate", owner_id, list_id, task_id)?;
        self.transition(owner_id, list_id, task_id, &TaskChange::SetDueDate(due_date))
            .await
    }

    /// Sets the priority.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist.
    pub async fn set_priority(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        priority: TaskPriority,
    ) -> TaskServiceResult<bool> {
        require_task_scope("SetPriority", owner_id, list_id, task_id)?;
        self.transition(owner_id, list_id, task_id, &TaskChange::SetPriority(priority))
            .await
    }

    /// Marks a task complete.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist.
    pub async fn complete(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskServiceResult<bool> {
        require_task_scope("Complete", owner_id, list_id, task_id)?;
        self.transition(owner_id, list_id, task_id, &TaskChange::Complete)
            .await
    }

    /// Marks a task incomplete again.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist.
    pub async fn resume(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskServiceResult<bool> {
        require_task_scope("Resume", owner_id, list_id, task_id)?;
        self.transition(owner_id, list_id, task_id, &TaskChange::Resume)
            .await
    }

    /// Pins a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist.
    pub async fn pin(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskServiceResult<bool> {
        require_task_scope("Pin", owner_id, list_id, task_id)?;
        self.transition(owner_id, list_id, task_id, &TaskChange::Pin)
            .await
    }

    /// Unpins a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist.
    pub async fn unpin(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskServiceResult<bool> {
        require_task_scope("Unpin", owner_id, list_id, task_id)?;
        self.transition(owner_id, list_id, task_id, &TaskChange::Unpin)
            .await
    }

    /// Moves a task to the trash. Siblings keep their positions.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] wrapping a not-found error
    /// when the task does not exist.
    pub async fn trash(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskServiceResult<bool> {
        require_task_scope("Trash", owner_id, list_id, task_id)?;
        let changed = self
            .repository
            .trash(owner_id, list_id, task_id, self.clock.utc())
            .await?;
        tracing::debug!(task_id = %task_id, changed, "task trashed");
        Ok(changed)
    }

    /// Restores a trashed task at the end of its list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] wrapping a not-found error
    /// when the task does not exist.
    pub async fn restore_from_trash(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskServiceResult<bool> {
        require_task_scope("RestoreFromTrash", owner_id, list_id, task_id)?;
        let changed = self
            .repository
            .restore(owner_id, list_id, task_id, self.clock.utc())
            .await?;
        tracing::debug!(task_id = %task_id, changed, "task restored");
        Ok(changed)
    }

    /// Moves an active task into another list owned by the same user.
    /// Moving a task into its current list changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the target list does not
    /// belong to the owner, and a wrapped repository not-found error when the
    /// task is missing or trashed.
    pub async fn move_task(
        &self,
        owner_id: OwnerId,
        task_id: TaskId,
        target_list_id: ListId,
    ) -> TaskServiceResult<bool> {
        require_identifier("Move", "ownerID", owner_id)?;
        require_identifier("Move", "taskID", task_id)?;
        require_identifier("Move", "targetListID", target_list_id)?;
        self.ensure_list(owner_id, target_list_id).await?;
        self.relocate(owner_id, task_id, Relocation::to(target_list_id))
            .await
    }

    /// Moves a task into the owner's materialised today list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the owner has no
    /// materialised lists.
    pub async fn today(&self, owner_id: OwnerId, task_id: TaskId) -> TaskServiceResult<bool> {
        require_identifier("Today", "ownerID", owner_id)?;
        require_identifier("Today", "taskID", task_id)?;
        let special = self.require_special_lists(owner_id).await?;
        self.relocate(owner_id, task_id, Relocation::to(special.today))
            .await
    }

    /// Schedules a task for the start of tomorrow (UTC). A task sitting in
    /// the today list moves to the deferred list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the owner has no
    /// materialised lists or the task is missing or trashed.
    pub async fn tomorrow(&self, owner_id: OwnerId, task_id: TaskId) -> TaskServiceResult<bool> {
        require_identifier("Tomorrow", "ownerID", owner_id)?;
        require_identifier("Tomorrow", "taskID", task_id)?;
        let special = self.require_special_lists(owner_id).await?;
        let current = self.find_active_owned(owner_id, task_id).await?;
        let window = DayWindow::after(self.clock.utc().date_naive())
            .ok_or(TaskDomainError::DateOutOfRange("tomorrow"))?;

        let target = if current.list_id() == special.today {
            special.deferred
        } else {
            current.list_id()
        };
        let relocation =
            Relocation::to(target).with_due_date(DueDateChange::Set(window.start()));
        self.relocate(owner_id, task_id, relocation).await
    }

    /// Clears the due date and moves the task into the deferred list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the owner has no
    /// materialised lists.
    pub async fn defer(&self, owner_id: OwnerId, task_id: TaskId) -> TaskServiceResult<bool> {
        require_identifier("Defer", "ownerID", owner_id)?;
        require_identifier("Defer", "taskID", task_id)?;
        let special = self.require_special_lists(owner_id).await?;
        let relocation = Relocation::to(special.deferred).with_due_date(DueDateChange::Clear);
        self.relocate(owner_id, task_id, relocation).await
    }

    /// Permanently removes a task and repacks its list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] wrapping a not-found error
    /// when the task does not exist.
    pub async fn delete(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskServiceResult<()> {
        require_task_scope("Delete", owner_id, list_id, task_id)?;
        self.repository.delete(owner_id, list_id, task_id).await?;
        tracing::debug!(task_id = %task_id, list_id = %list_id, "task deleted");
        Ok(())
    }

    /// Applies an attribute change through the repository, which reads and
    /// writes the task atomically.
    async fn transition(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
        change: &TaskChange,
    ) -> TaskServiceResult<bool> {
        let changed = self
            .repository
            .modify(owner_id, list_id, task_id, change, self.clock.utc())
            .await
            .map_err(|err| match err {
                TaskRepositoryError::NotFound(missing) => not_found(MissingEntity::Task(missing)),
                other => other.into(),
            })?;
        if changed {
            tracing::debug!(task_id = %task_id, "task attributes updated");
        }
        Ok(changed)
    }

    async fn relocate(
        &self,
        owner_id: OwnerId,
        task_id: TaskId,
        relocation: Relocation,
    ) -> TaskServiceResult<bool> {
        let changed = self
            .repository
            .relocate(owner_id, task_id, relocation, self.clock.utc())
            .await?;
        tracing::debug!(
            task_id = %task_id,
            target = %relocation.target,
            changed,
            "task relocated"
        );
        Ok(changed)
    }

    async fn find_scoped(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        task_id: TaskId,
    ) -> TaskServiceResult<Task> {
        self.repository
            .find(owner_id, list_id, task_id)
            .await?
            .ok_or_else(|| not_found(MissingEntity::Task(task_id)))
    }

    async fn find_active_owned(&self, owner_id: OwnerId, task_id: TaskId) -> TaskServiceResult<Task> {
        self.repository
            .find_owned(owner_id, task_id)
            .await?
            .filter(|task| !task.is_trashed())
            .ok_or_else(|| not_found(MissingEntity::Task(task_id)))
    }

    pub(super) async fn ensure_list(&self, owner_id: OwnerId, list_id: ListId) -> TaskServiceResult<()> {
        if self.directory.list_belongs_to(owner_id, list_id).await? {
            Ok(())
        } else {
            Err(not_found(MissingEntity::List(list_id)))
        }
    }

    pub(super) async fn ensure_user(&self, owner_id: OwnerId) -> TaskServiceResult<()> {
        if self.directory.user_exists(owner_id).await? {
            Ok(())
        } else {
            Err(not_found(MissingEntity::User(owner_id)))
        }
    }

    async fn require_special_lists(&self, owner_id: OwnerId) -> TaskServiceResult<SpecialLists> {
        self.directory
            .special_lists(owner_id)
            .await?
            .ok_or_else(|| not_found(MissingEntity::SpecialLists(owner_id)))
    }
}

fn require_task_scope(
    operation: &'static str,
    owner_id: OwnerId,
    list_id: ListId,
    task_id: TaskId,
) -> TaskServiceResult<()> {
    require_identifier(operation, "ownerID", owner_id)?;
    require_identifier(operation, "listID", list_id)?;
    require_identifier(operation, "taskID", task_id)
}

fn not_found(entity: MissingEntity) -> TaskServiceError {
    tracing::warn!(%entity, "scoped lookup found nothing");
    TaskServiceError::NotFound(entity)
}
