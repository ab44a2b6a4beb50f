//! Error types and handling
//!
//! This module provides the error types used throughout the Repopulse engine.
//! All errors implement the `PulseErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Propagation
//!
//! Only input and configuration errors are expected to cross the orchestration
//! boundary as failures. Collaborator problems (remote memory service, local
//! persistence, corrupt documents) are absorbed into an [`Outcome`] and logged.
//!
//! [`Outcome`]: crate::outcome::Outcome

use thiserror::Error;

/// Trait for Repopulse error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait PulseErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// credentials or internal file paths.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors require a configuration change or a different request.
    fn is_recoverable(&self) -> bool;

    /// Returns whether the error was caused by the caller's input
    fn is_input_error(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid config file or missing credentials
/// - **Input**: Unparseable repository identity, missing request parameters
/// - **Storage**: Local memory document I/O failures
/// - **Memory service**: Remote memory service failures
/// - **Task execution**: The reasoning service could not run a task
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, PulseErrorExt};
///
/// let error = EngineError::InvalidRepository("not a repo".to_string());
/// assert!(error.is_input_error());
/// println!("Hint: {}", error.user_hint());
///
/// let fatal = EngineError::MissingCredential("ANTHROPIC_API_KEY".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    // Input errors
    #[error("Invalid repository identity: {0}")]
    InvalidRepository(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: String, value: String },

    // Local memory store errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt memory document: {0}")]
    CorruptDocument(String),

    // Remote memory service errors
    #[error("Memory service error: {0}")]
    MemoryService(String),

    // Task execution errors
    #[error("Task execution error: {0}")]
    TaskExecution(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PulseErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            // Configuration errors
            Self::Config(_) => "Check your config.toml file for errors",
            Self::MissingCredential(_) => {
                "Set the credential environment variable named in config.toml"
            }

            // Input errors
            Self::InvalidRepository(_) => {
                "Use an owner/name slug or a full repository URL, e.g. acme/widgets"
            }
            Self::MissingParameter(_) => "A required request parameter is missing",
            Self::InvalidParameter { .. } => "A request parameter has an unsupported value",

            // Storage errors
            Self::Storage(_) => "Memory could not be written. Check the data directory",
            Self::CorruptDocument(_) => "Stored memory is unreadable and will be ignored",

            // Remote memory service errors
            Self::MemoryService(_) => "Remote memory unavailable. Continuing with local memory",

            // Task execution errors
            Self::TaskExecution(_) => "The task service failed to run the task. Try again",

            // Network errors
            Self::Network(_) => "Network operation failed. Check your connection",

            // Serialization errors
            Self::Serialization(_) => "Data could not be encoded or decoded",

            // Generic IO error
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Non-recoverable errors
            Self::Config(_)
            | Self::MissingCredential(_)
            | Self::InvalidRepository(_)
            | Self::MissingParameter(_)
            | Self::InvalidParameter { .. } => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }

    fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRepository(_) | Self::MissingParameter(_) | Self::InvalidParameter { .. }
        )
    }
}
