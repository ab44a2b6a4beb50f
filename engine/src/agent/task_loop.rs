//! Task Execution Loop
//!
//! Drives one task on the execution service and folds its event stream into
//! a [`TaskTranscript`]. The service owns the plan/act/observe cycle; this
//! loop only consumes what it reports.
//!
//! - `text` fragments are concatenated in arrival order
//! - `tool_use` is recorded and published, never acted upon
//! - `error` is recorded and published; the stream keeps going
//! - everything else is logged at debug level

use futures::StreamExt;
use sdk::types::TaskEvent;
use sdk::Outcome;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ToolServerConfig;
use crate::executor::{TaskExecutor, TaskRequest};
use crate::message_bus::{Event, MessageBus};

/// Everything the loop saw during one task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskTranscript {
    /// Concatenated text output, trimmed
    pub text: String,

    /// Tools invoked, in order
    pub tools_used: Vec<String>,

    /// Errors reported mid-stream
    pub errors: Vec<String>,

    /// Number of events consumed
    pub events: usize,
}

/// Runs tasks against a [`TaskExecutor`]
pub struct TaskLoop {
    executor: Arc<dyn TaskExecutor>,
    bus: Option<Arc<MessageBus>>,
    model: String,
    max_iterations: u32,
    tool_server: Option<ToolServerConfig>,
}

impl TaskLoop {
    pub fn new(executor: Arc<dyn TaskExecutor>, model: impl Into<String>, max_iterations: u32) -> Self {
        Self {
            executor,
            bus: None,
            model: model.into(),
            max_iterations,
            tool_server: None,
        }
    }

    /// Attach the repository-inspection tool server to every submission
    pub fn with_tool_server(mut self, tool_server: ToolServerConfig) -> Self {
        self.tool_server = Some(tool_server);
        self
    }

    /// Publish tool and error events on `bus`
    pub fn with_bus(mut self, bus: Arc<MessageBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Submit `instructions` and drain the resulting event stream
    ///
    /// Returns `Outcome::Fatal` only when the task could not be submitted.
    pub async fn run(&self, run_id: &str, instructions: String) -> Outcome<TaskTranscript> {
        let request = TaskRequest {
            instructions,
            model: self.model.clone(),
            max_iterations: self.max_iterations,
            tool_server: self.tool_server.clone(),
        };

        let mut stream = match self.executor.submit(request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(run_id, executor = self.executor.name(), "Task submission failed: {}", e);
                return Outcome::Fatal(e);
            }
        };

        let mut transcript = TaskTranscript::default();
        let mut text = String::new();

        while let Some(event) = stream.next().await {
            transcript.events += 1;
            match event {
                TaskEvent::Text { content } => text.push_str(&content),
                TaskEvent::ToolUse { name, .. } => {
                    info!(run_id, tool = %name, "Agent used tool");
                    self.publish(Event::ToolUsed {
                        run_id: run_id.to_string(),
                        tool: name.clone(),
                    })
                    .await;
                    transcript.tools_used.push(name);
                }
                TaskEvent::Error { message } => {
                    warn!(run_id, "Task service reported an error: {}", message);
                    self.publish(Event::TaskError {
                        run_id: run_id.to_string(),
                        message: message.clone(),
                    })
                    .await;
                    transcript.errors.push(message);
                }
                other => debug!(run_id, kind = other.kind(), "Task event"),
            }
        }

        transcript.text = text.trim().to_string();

        info!(
            run_id,
            events = transcript.events,
            tools = transcript.tools_used.len(),
            errors = transcript.errors.len(),
            "Task stream finished"
        );

        Outcome::Ok(transcript)
    }

    async fn publish(&self, event: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{Result, TaskEventStream};
    use crate::message_bus::EventType;
    use async_trait::async_trait;
    use futures::stream;
    use sdk::errors::EngineError;
    use std::sync::Mutex;

    struct ScriptedExecutor {
        events: Vec<TaskEvent>,
        seen: Mutex<Vec<TaskRequest>>,
    }

    impl ScriptedExecutor {
        fn new(events: Vec<TaskEvent>) -> Self {
            Self {
                events,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TaskExecutor for ScriptedExecutor {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn submit(&self, request: TaskRequest) -> Result<TaskEventStream> {
            self.seen.lock().unwrap().push(request);
            Ok(stream::iter(self.events.clone()).boxed())
        }
    }

    struct RefusingExecutor;

    #[async_trait]
    impl TaskExecutor for RefusingExecutor {
        fn name(&self) -> &str {
            "refusing"
        }

        async fn submit(&self, _request: TaskRequest) -> Result<TaskEventStream> {
            Err(EngineError::TaskExecution("quota exhausted".to_string()))
        }
    }

    #[tokio::test]
    async fn test_text_concatenated_in_order_and_trimmed() {
        let executor = Arc::new(ScriptedExecutor::new(vec![
            TaskEvent::text("  Health Score: "),
            TaskEvent::Checkpoint { id: Some("c1".into()) },
            TaskEvent::text("72/100\n"),
            TaskEvent::text("## Summary  \n"),
        ]));
        let task_loop = TaskLoop::new(executor.clone(), "model-x", 7);

        let transcript = task_loop.run("run-1", "inspect".into()).await.ok().unwrap();
        assert_eq!(transcript.text, "Health Score: 72/100\n## Summary");
        assert_eq!(transcript.events, 4);

        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen[0].model, "model-x");
        assert_eq!(seen[0].max_iterations, 7);
        assert!(seen[0].tool_server.is_none());
    }

    #[tokio::test]
    async fn test_errors_and_tools_do_not_stop_the_stream() {
        let bus = Arc::new(MessageBus::new());
        let mut rx = bus.subscribe(EventType::All).await;
        let executor = Arc::new(ScriptedExecutor::new(vec![
            TaskEvent::text("before "),
            TaskEvent::tool_use("list_issues"),
            TaskEvent::error("rate limited"),
            TaskEvent::text("after"),
        ]));
        let task_loop = TaskLoop::new(executor, "m", 1)
            .with_bus(bus)
            .with_tool_server(ToolServerConfig::default());

        let transcript = task_loop.run("run-2", "go".into()).await.ok().unwrap();
        assert_eq!(transcript.text, "before after");
        assert_eq!(transcript.tools_used, vec!["list_issues".to_string()]);
        assert_eq!(transcript.errors, vec!["rate limited".to_string()]);

        assert!(matches!(rx.recv().await.unwrap(), Event::ToolUsed { tool, .. } if tool == "list_issues"));
        assert!(matches!(rx.recv().await.unwrap(), Event::TaskError { message, .. } if message == "rate limited"));
    }

    #[tokio::test]
    async fn test_empty_stream_gives_empty_text() {
        let task_loop = TaskLoop::new(Arc::new(ScriptedExecutor::new(vec![])), "m", 1);
        let transcript = task_loop.run("run-3", "go".into()).await.ok().unwrap();
        assert_eq!(transcript, TaskTranscript::default());
    }

    #[tokio::test]
    async fn test_submission_failure_is_fatal() {
        let task_loop = TaskLoop::new(Arc::new(RefusingExecutor), "m", 1);
        let outcome = task_loop.run("run-4", "go".into()).await;
        assert!(matches!(outcome, Outcome::Fatal(EngineError::TaskExecution(_))));
    }
}
