//! Task aggregate root and its state machine.

use super::{
    Completion, ListId, OwnerId, TaskCreation, TaskId, TaskLifecycle, TaskPriority, TaskStatus,
    TaskUpdate,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Attribute change applied to a task as one atomic step.
///
/// Placement and lifecycle changes are structural and go through the
/// repository's ordering operations instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    /// Mark the task complete.
    Complete,
    /// Mark the task incomplete.
    Resume,
    /// Pin the task.
    Pin,
    /// Unpin the task.
    Unpin,
    /// Set the priority.
    SetPriority(TaskPriority),
    /// Set or clear the due date.
    SetDueDate(Option<DateTime<Utc>>),
    /// Set or clear the reminder.
    SetReminder(Option<DateTime<Utc>>),
    /// Replace the free-text content with a normalised payload.
    Edit(TaskUpdate),
}

/// Stores `value` in `slot`, reporting whether it differed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Task aggregate root.
///
/// Status, pin and lifecycle are independent sub-states. Every transition
/// reports whether it changed anything so callers can distinguish a no-op
/// from a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    owner_id: OwnerId,
    list_id: ListId,
    position: u64,
    title: String,
    headline: String,
    description: String,
    priority: TaskPriority,
    completion: Completion,
    is_pinned: bool,
    due_date: Option<DateTime<Utc>>,
    remind_at: Option<DateTime<Utc>>,
    lifecycle: TaskLifecycle,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Owning user.
    pub owner_id: OwnerId,
    /// Containing list.
    pub list_id: ListId,
    /// Position in the list's manual ordering.
    pub position: u64,
    /// Title.
    pub title: String,
    /// Headline.
    pub headline: String,
    /// Description.
    pub description: String,
    /// Priority.
    pub priority: TaskPriority,
    /// Completion sub-state.
    pub completion: Completion,
    /// Pin flag.
    pub is_pinned: bool,
    /// Due date, if any.
    pub due_date: Option<DateTime<Utc>>,
    /// Reminder instant, if any.
    pub remind_at: Option<DateTime<Utc>>,
    /// Lifecycle sub-state.
    pub lifecycle: TaskLifecycle,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new active task from a normalised creation payload.
    ///
    /// The position is provisional; repositories assign the append slot of
    /// the target list on insert.
    #[must_use]
    pub fn create(
        owner_id: OwnerId,
        list_id: ListId,
        creation: &TaskCreation,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            owner_id,
            list_id,
            position: 0,
            title: creation.title.clone(),
            headline: creation.headline.clone(),
            description: creation.description.clone(),
            priority: creation.priority.unwrap_or_default(),
            completion: Completion::for_status(creation.status.unwrap_or_default(), timestamp),
            is_pinned: false,
            due_date: creation.due_date,
            remind_at: creation.remind_at,
            lifecycle: TaskLifecycle::Active,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            owner_id: data.owner_id,
            list_id: data.list_id,
            position: data.position,
            title: data.title,
            headline: data.headline,
            description: data.description,
            priority: data.priority,
            completion: data.completion,
            is_pinned: data.is_pinned,
            due_date: data.due_date,
            remind_at: data.remind_at,
            lifecycle: data.lifecycle,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Builds an active replica with a fresh identifier in the same list.
    ///
    /// Content, priority, status, pin and schedule are copied; the source is
    /// left untouched.
    #[must_use]
    pub fn replicate(&self, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            lifecycle: TaskLifecycle::Active,
            created_at: timestamp,
            updated_at: timestamp,
            ..self.clone()
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    /// Returns the containing list.
    #[must_use]
    pub const fn list_id(&self) -> ListId {
        self.list_id
    }

    /// Returns the position in the list's manual ordering.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the headline.
    #[must_use]
    pub fn headline(&self) -> &str {
        &self.headline
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the completion sub-state.
    #[must_use]
    pub const fn completion(&self) -> Completion {
        self.completion
    }

    /// Returns the completion status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.completion.status()
    }

    /// Returns the completion timestamp, if complete.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completion.completed_at()
    }

    /// Returns `true` when the task is pinned.
    #[must_use]
    pub const fn is_pinned(&self) -> bool {
        self.is_pinned
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the reminder instant, if any.
    #[must_use]
    pub const fn remind_at(&self) -> Option<DateTime<Utc>> {
        self.remind_at
    }

    /// Returns the lifecycle sub-state.
    #[must_use]
    pub const fn lifecycle(&self) -> TaskLifecycle {
        self.lifecycle
    }

    /// Returns `true` when the task is in the trash.
    #[must_use]
    pub const fn is_trashed(&self) -> bool {
        !self.lifecycle.is_active()
    }

    /// Returns the trash timestamp, if trashed.
    #[must_use]
    pub const fn trashed_at(&self) -> Option<DateTime<Utc>> {
        self.lifecycle.trashed_at()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies an attribute change stamped at `at`. Returns `false` when the
    /// task already was in the requested state.
    pub fn apply_change(&mut self, change: &TaskChange, at: DateTime<Utc>) -> bool {
        let changed = match change {
            TaskChange::Complete if self.status() == TaskStatus::Complete => false,
            TaskChange::Complete => {
                self.completion = Completion::Complete { at };
                true
            }
            TaskChange::Resume => replace(&mut self.completion, Completion::Incomplete),
            TaskChange::Pin => replace(&mut self.is_pinned, true),
            TaskChange::Unpin => replace(&mut self.is_pinned, false),
            TaskChange::SetPriority(priority) => replace(&mut self.priority, *priority),
            TaskChange::SetDueDate(due_date) => replace(&mut self.due_date, *due_date),
            TaskChange::SetReminder(remind_at) => replace(&mut self.remind_at, *remind_at),
            TaskChange::Edit(update) => self.edit(update),
        };
        if changed {
            self.updated_at = at;
        }
        changed
    }

    /// Marks the task complete. Returns `false` if it already was.
    pub fn complete(&mut self, clock: &impl Clock) -> bool {
        self.apply_change(&TaskChange::Complete, clock.utc())
    }

    /// Marks the task incomplete again. Returns `false` if it already was.
    pub fn resume(&mut self, clock: &impl Clock) -> bool {
        self.apply_change(&TaskChange::Resume, clock.utc())
    }

    /// Pins the task. Returns `false` if it already was pinned.
    pub fn pin(&mut self, clock: &impl Clock) -> bool {
        self.apply_change(&TaskChange::Pin, clock.utc())
    }

    /// Unpins the task. Returns `false` if it was not pinned.
    pub fn unpin(&mut self, clock: &impl Clock) -> bool {
        self.apply_change(&TaskChange::Unpin, clock.utc())
    }

    /// Sets the priority.
    pub fn set_priority(&mut self, priority: TaskPriority, clock: &impl Clock) -> bool {
        self.apply_change(&TaskChange::SetPriority(priority), clock.utc())
    }

    /// Sets or clears the due date.
    pub fn set_due_date(&mut self, due_date: Option<DateTime<Utc>>, clock: &impl Clock) -> bool {
        self.apply_change(&TaskChange::SetDueDate(due_date), clock.utc())
    }

    /// Sets or clears the reminder.
    pub fn set_reminder(&mut self, remind_at: Option<DateTime<Utc>>, clock: &impl Clock) -> bool {
        self.apply_change(&TaskChange::SetReminder(remind_at), clock.utc())
    }

    /// Replaces the free-text content with a normalised update payload.
    pub fn apply_update(&mut self, update: &TaskUpdate, clock: &impl Clock) -> bool {
        let at = clock.utc();
        let changed = self.edit(update);
        if changed {
            self.updated_at = at;
        }
        changed
    }

    /// Moves the task to the trash. Returns `false` if already trashed.
    ///
    /// The position is retained and ignored while trashed.
    pub fn trash(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_trashed() {
            return false;
        }
        self.lifecycle = TaskLifecycle::Trashed { at };
        self.updated_at = at;
        true
    }

    /// Restores the task from the trash into the given append slot.
    /// Returns `false` if the task was active.
    pub fn restore(&mut self, slot: u64, at: DateTime<Utc>) -> bool {
        if !self.is_trashed() {
            return false;
        }
        self.lifecycle = TaskLifecycle::Active;
        self.position = slot;
        self.updated_at = at;
        true
    }

    /// Places the task at a position of a list. Used by position repacks.
    pub(crate) const fn place(&mut self, list_id: ListId, position: u64) {
        self.list_id = list_id;
        self.position = position;
    }

    /// Overwrites the due date while relocating; does not touch timestamps.
    pub(crate) const fn reschedule(&mut self, due_date: Option<DateTime<Utc>>) {
        self.due_date = due_date;
    }

    pub(crate) const fn stamp(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn edit(&mut self, update: &TaskUpdate) -> bool {
        if self.title == update.title
            && self.headline == update.headline
            && self.description == update.description
        {
            return false;
        }
        update.title.clone_into(&mut self.title);
        update.headline.clone_into(&mut self.headline);
        update.description.clone_into(&mut self.description);
        true
    }
}
