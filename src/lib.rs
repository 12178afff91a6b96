//! Noda: task lifecycle and ordering engine for a personal task manager.
//!
//! This crate provides the backend domain and data layer behind the task
//! features of Noda: a task state machine, dense per-list manual ordering,
//! cross-list moves including the today, tomorrow and deferred views, and
//! the paging, search and sort contract honoured by every listing.
//!
//! # Architecture
//!
//! Noda follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`task`]: Task aggregate, ordering, queries and the task service
//! - [`pagination`]: Page requests and the result envelope
//! - [`config`]: Environment-driven configuration
//! - [`telemetry`]: Tracing subscriber setup

pub mod config;
pub mod pagination;
pub mod task;
pub mod telemetry;
