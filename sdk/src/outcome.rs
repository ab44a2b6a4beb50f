//! Collaborator outcomes
//!
//! Every call that crosses into a collaborator (local memory store, remote
//! memory service, task execution service) reports back as an [`Outcome`]
//! instead of a bare `Result`. Degradation is a value the caller can inspect
//! and log, not something swallowed inside the collaborator.

use crate::errors::EngineError;

/// Result of a call into a collaborator
#[derive(Debug)]
pub enum Outcome<T> {
    /// The call succeeded
    Ok(T),

    /// The call failed in a way the caller is expected to absorb
    Degraded(String),

    /// The call failed in a way that must abort the invocation
    Fatal(EngineError),
}

impl<T> Outcome<T> {
    /// Build a degraded outcome from a reason
    pub fn degraded(reason: impl Into<String>) -> Self {
        Outcome::Degraded(reason.into())
    }

    /// Absorb `error` as a degraded outcome, keeping its message
    pub fn degraded_by(error: EngineError) -> Self {
        Outcome::Degraded(error.to_string())
    }

    /// Returns true if the call succeeded
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    /// Returns true if the call degraded
    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded(_))
    }

    /// The success value, or `None` when degraded or fatal
    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Ok(value) => Some(value),
            Outcome::Degraded(_) | Outcome::Fatal(_) => None,
        }
    }

    /// The degradation reason, if any
    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            Outcome::Degraded(reason) => Some(reason),
            _ => None,
        }
    }

    /// Map the success value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::Degraded(reason) => Outcome::Degraded(reason),
            Outcome::Fatal(error) => Outcome::Fatal(error),
        }
    }

    /// Collapse into a `Result`, substituting `fallback` for a degraded call.
    ///
    /// Only `Fatal` becomes an error.
    pub fn or_degrade_to(self, fallback: T) -> Result<T, EngineError> {
        match self {
            Outcome::Ok(value) => Ok(value),
            Outcome::Degraded(_) => Ok(fallback),
            Outcome::Fatal(error) => Err(error),
        }
    }
}

impl<T> From<Result<T, EngineError>> for Outcome<T> {
    fn from(result: Result<T, EngineError>) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(error) => Outcome::Fatal(error),
        }
    }
}
