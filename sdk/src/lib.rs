//! Repopulse SDK
//!
//! Shared vocabulary for Repopulse components: the error taxonomy, the
//! collaborator `Outcome` type, and the domain types that cross crate
//! boundaries.

/// Error types and handling
pub mod errors;

/// Collaborator outcomes
pub mod outcome;

/// Repository identity, modes, scenarios and task events
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, PulseErrorExt};
pub use outcome::Outcome;
pub use types::{Mode, RepoId, Scenario, TaskEvent};
