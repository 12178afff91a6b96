//! Port contracts for the task engine.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod directory;
pub mod repository;

pub use directory::{DirectoryError, DirectoryResult, OwnershipDirectory, SpecialLists};
pub use repository::{
    DueDateChange, Relocation, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
};

#[cfg(test)]
pub use directory::MockOwnershipDirectory;
#[cfg(test)]
pub use repository::MockTaskRepository;
