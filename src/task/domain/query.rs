//! Read-side query model: selection axes, search needle and sort order.

use super::{ListId, Task};
use crate::pagination::Pagination;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use std::cmp::Ordering;

/// Case-insensitive substring filter over title, headline and description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Needle(String);

impl Needle {
    /// Builds a needle from raw input, trimming it first.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// Returns the normalised needle text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the needle matches everything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` when any searchable field contains the needle.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.is_empty()
            || [task.title(), task.headline(), task.description()]
                .iter()
                .any(|field| field.to_lowercase().contains(&self.0))
    }
}

/// Sortable task fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    /// Manual position.
    Position,
    /// Title text.
    Title,
    /// Headline text.
    Headline,
    /// Description text.
    Description,
    /// Priority rank.
    Priority,
    /// Completion status.
    Status,
    /// Due date.
    DueDate,
    /// Reminder instant.
    RemindAt,
    /// Completion instant.
    CompletedAt,
    /// Creation instant.
    CreatedAt,
    /// Last update instant.
    UpdatedAt,
}

impl SortField {
    /// Resolves a field name, accepting snake and camel case spellings.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name {
            "position" | "position_in_list" | "positionInList" => Self::Position,
            "title" => Self::Title,
            "headline" => Self::Headline,
            "description" => Self::Description,
            "priority" => Self::Priority,
            "status" => Self::Status,
            "due_date" | "dueDate" => Self::DueDate,
            "remind_at" | "remindAt" => Self::RemindAt,
            "completed_at" | "completedAt" => Self::CompletedAt,
            "created_at" | "createdAt" => Self::CreatedAt,
            "updated_at" | "updatedAt" => Self::UpdatedAt,
            _ => return None,
        };
        Some(field)
    }

    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            Self::Position => a.position().cmp(&b.position()),
            Self::Title => a.title().cmp(b.title()),
            Self::Headline => a.headline().cmp(b.headline()),
            Self::Description => a.description().cmp(b.description()),
            Self::Priority => a.priority().rank().cmp(&b.priority().rank()),
            Self::Status => a.status().cmp(&b.status()),
            Self::DueDate => nulls_last(a.due_date(), b.due_date()),
            Self::RemindAt => nulls_last(a.remind_at(), b.remind_at()),
            Self::CompletedAt => nulls_last(a.completed_at(), b.completed_at()),
            Self::CreatedAt => a.created_at().cmp(&b.created_at()),
            Self::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// Parsed sort expression such as `title` or `-due_date`.
///
/// An empty or unrecognised expression selects the default order: pinned
/// tasks first, then manual position ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SortExpression {
    field: Option<SortField>,
    direction: SortDirection,
}

impl SortExpression {
    /// Parses a sort expression. A leading `-` selects descending order.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let (direction, name) = trimmed.strip_prefix('-').map_or(
            (SortDirection::Ascending, trimmed),
            |rest| (SortDirection::Descending, rest.trim()),
        );
        SortField::from_name(name).map_or_else(Self::default, |field| Self {
            field: Some(field),
            direction,
        })
    }

    /// Creates an explicit sort expression.
    #[must_use]
    pub const fn by(field: SortField, direction: SortDirection) -> Self {
        Self {
            field: Some(field),
            direction,
        }
    }

    /// Returns the sort field, or `None` for the default order.
    #[must_use]
    pub const fn field(&self) -> Option<SortField> {
        self.field
    }

    /// Returns the sort direction.
    #[must_use]
    pub const fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Compares two tasks under this expression. Ties fall back to position
    /// and then creation time.
    #[must_use]
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let primary = match self.field {
            None => b.is_pinned().cmp(&a.is_pinned()),
            Some(field) => match self.direction {
                SortDirection::Ascending => field.compare(a, b),
                SortDirection::Descending => field.compare(a, b).reverse(),
            },
        };
        primary
            .then_with(|| a.position().cmp(&b.position()))
            .then_with(|| a.created_at().cmp(&b.created_at()))
            .then_with(|| a.id().cmp(&b.id()))
    }
}

fn nulls_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Half-open UTC interval covering one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DayWindow {
    /// Returns the window of the given date, or `None` at the edge of the
    /// representable range.
    #[must_use]
    pub fn of(date: NaiveDate) -> Option<Self> {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start.checked_add_signed(TimeDelta::try_days(1)?)?;
        Some(Self { start, end })
    }

    /// Returns the window of the day after `date`.
    #[must_use]
    pub fn after(date: NaiveDate) -> Option<Self> {
        Self::of(date.succ_opt()?)
    }

    /// Inclusive start of the day.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive end of the day.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns `true` when the instant falls on this day.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Which active tasks of an owner a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskSelection {
    /// All active tasks of one list.
    List(ListId),
    /// Tasks due within the window, unioned with the members of a
    /// materialised list when one is given.
    DueWithin {
        /// Calendar day to match due dates against.
        window: DayWindow,
        /// Materialised list whose members are always included.
        including_list: Option<ListId>,
    },
    /// Tasks without a due date, excluding the members of a materialised
    /// list when one is given.
    Unscheduled {
        /// Materialised list whose members are excluded.
        excluding_list: Option<ListId>,
    },
}

impl TaskSelection {
    /// Returns `true` when the task belongs to the selection.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        match *self {
            Self::List(list_id) => task.list_id() == list_id,
            Self::DueWithin {
                window,
                including_list,
            } => {
                task.due_date().is_some_and(|due| window.contains(due))
                    || including_list == Some(task.list_id())
            }
            Self::Unscheduled { excluding_list } => {
                task.due_date().is_none() && excluding_list != Some(task.list_id())
            }
        }
    }
}

/// Complete description of a listing read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    /// Which tasks to read.
    pub selection: TaskSelection,
    /// Search filter.
    pub needle: Needle,
    /// Result order.
    pub sort: SortExpression,
    /// Normalised page request.
    pub pagination: Pagination,
}

impl TaskQuery {
    /// Creates a query.
    #[must_use]
    pub const fn new(
        selection: TaskSelection,
        needle: Needle,
        sort: SortExpression,
        pagination: Pagination,
    ) -> Self {
        Self {
            selection,
            needle,
            sort,
            pagination,
        }
    }

    /// Returns `true` when an active task satisfies selection and needle.
    #[must_use]
    pub fn admits(&self, task: &Task) -> bool {
        !task.is_trashed() && self.selection.matches(task) && self.needle.matches(task)
    }
}
