//! Repopulse Engine Library
//!
//! Memory-augmented repository health checks. Used by the `repopulse`
//! binary and by the integration tests.

/// Configuration management module
pub mod config;

/// Repository memory: local store and remote gateway
pub mod memory;

/// Health score extraction
pub mod score;

/// Task prompt composition
pub mod prompt;

/// Task execution service abstraction
pub mod executor;

/// Message bus for run lifecycle events
pub mod message_bus;

/// Health agent façade and task loop
pub mod agent;

/// Daily scheduled runs
pub mod scheduler;

/// HTTP request surface
pub mod api;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
