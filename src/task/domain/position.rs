//! Manual ordering of the active tasks of a single list.
//!
//! Both repository adapters load the active slots of a list under their
//! lock, apply one structural operation here, and write back only the slots
//! whose position changed.

use super::TaskId;

/// A task's position within its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    /// The task occupying the slot.
    pub task_id: TaskId,
    /// Position in the manual ordering.
    pub position: u64,
}

impl Slot {
    /// Creates a slot.
    #[must_use]
    pub const fn new(task_id: TaskId, position: u64) -> Self {
        Self { task_id, position }
    }
}

/// Ordered view of the active slots of one `(owner, list)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionIndex {
    slots: Vec<Slot>,
}

impl PositionIndex {
    /// Builds an index from slots in any order.
    ///
    /// Slots sharing a position keep a deterministic order by task
    /// identifier, so a later repack resolves the collision.
    #[must_use]
    pub fn from_slots(slots: impl IntoIterator<Item = Slot>) -> Self {
        let mut collected: Vec<Slot> = slots.into_iter().collect();
        collected.sort_by_key(|slot| (slot.position, slot.task_id));
        Self { slots: collected }
    }

    /// Returns the number of active tasks.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` when the list has no active tasks.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the slots in manual order.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Returns the position of a task, if it is active in this list.
    #[must_use]
    pub fn position_of(&self, task_id: TaskId) -> Option<u64> {
        self.slots
            .iter()
            .find(|slot| slot.task_id == task_id)
            .map(|slot| slot.position)
    }

    /// Returns `true` when positions are exactly `0..len`.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        self.slots
            .iter()
            .zip(0_u64..)
            .all(|(slot, expected)| slot.position == expected)
    }

    /// Returns the slot a newly appended task receives: one past the highest
    /// active position, or zero for an empty list.
    #[must_use]
    pub fn append_slot(&self) -> u64 {
        self.slots
            .last()
            .map_or(0, |slot| slot.position.saturating_add(1))
    }

    /// Appends a task at the end of the ordering and returns its position.
    pub fn append(&mut self, task_id: TaskId) -> u64 {
        let position = self.append_slot();
        self.slots.push(Slot::new(task_id, position));
        position
    }

    /// Removes a task and repacks the remaining slots.
    ///
    /// Returns `false` when the task is not in the index. The repack also
    /// runs in that case, closing any gaps.
    pub fn remove(&mut self, task_id: TaskId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.task_id != task_id);
        self.repack();
        self.slots.len() != before
    }

    /// Moves a task to `target`, clamped to `[0, len - 1]`, shifting the
    /// tasks in between by one and repacking the list.
    ///
    /// Returns `None` when the task is not in the index.
    pub fn reorder(&mut self, task_id: TaskId, target: u64) -> Option<()> {
        let from = self.slots.iter().position(|slot| slot.task_id == task_id)?;
        let moved = self.slots.remove(from);
        let last = self.slots.len();
        let to = usize::try_from(target).map_or(last, |index| index.min(last));
        self.slots.insert(to, moved);
        self.repack();
        Some(())
    }

    /// Renumbers the slots `0..len` in their current order.
    pub fn repack(&mut self) {
        for (slot, position) in self.slots.iter_mut().zip(0_u64..) {
            slot.position = position;
        }
    }

    /// Returns the slots whose position differs from `before`, including
    /// slots absent from it.
    #[must_use]
    pub fn changes_from(&self, before: &Self) -> Vec<Slot> {
        self.slots
            .iter()
            .filter(|slot| before.position_of(slot.task_id) != Some(slot.position))
            .copied()
            .collect()
    }
}
