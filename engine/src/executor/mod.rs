//! Task execution service abstraction
//!
//! The reasoning service is a black box that accepts an instruction payload
//! and answers with an ordered, finite stream of [`TaskEvent`]s. The
//! `TaskExecutor` trait is the only way the engine reaches it; the
//! repository-inspection tool server is attached per request and never
//! called directly.

use async_trait::async_trait;
use futures::stream::BoxStream;
use sdk::errors::EngineError;
use sdk::types::TaskEvent;
use serde::Serialize;

use crate::config::ToolServerConfig;

pub mod http;

pub use http::HttpTaskExecutor;

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Ordered event stream of one task execution
pub type TaskEventStream = BoxStream<'static, TaskEvent>;

/// One task submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRequest {
    /// Composed instruction payload
    pub instructions: String,

    /// Model identifier
    pub model: String,

    /// Plan/act/observe cycle ceiling, enforced by the service
    pub max_iterations: u32,

    /// The single repository-inspection capability provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_server: Option<ToolServerConfig>,
}

/// Task execution service
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Returns the name of the executor (e.g., "http")
    fn name(&self) -> &str;

    /// Submit a task and return its event stream
    ///
    /// # Errors
    ///
    /// Returns an error only when the task could not be started. Problems
    /// after the stream has begun arrive as `TaskEvent::Error` items.
    async fn submit(&self, request: TaskRequest) -> Result<TaskEventStream>;
}
