//! Application services for task lifecycle and ordering.

mod error;
mod guards;
mod queries;
mod task_service;

pub use error::{MissingEntity, TaskServiceError, TaskServiceResult};
pub use guards::require_identifier;
pub use task_service::TaskService;
