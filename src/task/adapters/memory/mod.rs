//! In-memory adapter implementations for testing.
//!
//! These adapters provide simple, thread-safe implementations suitable for
//! unit testing without database dependencies.

mod directory;
mod task;

pub use directory::InMemoryOwnershipDirectory;
pub use task::InMemoryTaskRepository;
