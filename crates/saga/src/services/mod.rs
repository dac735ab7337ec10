//! In-memory collaborators for tests and local runs.

pub mod commands;
pub mod deadlines;
pub mod queries;

pub use commands::InMemoryCommandGateway;
pub use deadlines::ManualDeadlineManager;
pub use queries::InMemoryQueryGateway;
