//! Domain model for the task lifecycle and ordering engine.
//!
//! The domain covers the task aggregate and its state machine, the
//! per-list position index, payload validation and the read-side query
//! model, while keeping all infrastructure concerns outside of the domain
//! boundary.

mod error;
mod ids;
mod payload;
mod position;
mod query;
mod state;
mod task;
pub mod validation;

pub use error::{ParseIdError, ParseTaskPriorityError, ParseTaskStatusError, TaskDomainError};
pub use ids::{ListId, OwnerId, TaskId};
pub use payload::{TaskCreation, TaskUpdate};
pub use position::{PositionIndex, Slot};
pub use query::{
    DayWindow, Needle, SortDirection, SortExpression, SortField, TaskQuery, TaskSelection,
};
pub use state::{Completion, TaskLifecycle, TaskPriority, TaskStatus};
pub use task::{PersistedTaskData, Task, TaskChange};
pub use validation::{FieldLimits, TaskRules};
