//! HTTP task executor
//!
//! Submits tasks with `POST {base}/v1/tasks` and reads the response body as
//! newline-delimited JSON, one [`TaskEvent`] per line. Lines may also carry a
//! server-sent-events style `data:` prefix.
//!
//! Unknown or malformed lines are skipped. A transport failure after the
//! stream has started becomes a final `TaskEvent::Error`.

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use sdk::errors::EngineError;
use sdk::types::TaskEvent;
use serde_json::json;
use std::fmt::Display;
use tracing::{debug, info};

use super::{Result, TaskEventStream, TaskExecutor, TaskRequest};

pub struct HttpTaskExecutor {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpTaskExecutor {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TaskExecutor for HttpTaskExecutor {
    fn name(&self) -> &str {
        "http"
    }

    async fn submit(&self, request: TaskRequest) -> Result<TaskEventStream> {
        let url = format!("{}/v1/tasks", self.base_url);

        let payload = json!({
            "instructions": request.instructions,
            "model": request.model,
            "max_iterations": request.max_iterations,
            "tool_servers": request.tool_server.iter().collect::<Vec<_>>(),
        });

        info!(
            model = %request.model,
            max_iterations = request.max_iterations,
            prompt_len = request.instructions.len(),
            "Submitting task"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/x-ndjson")
            .json(&payload)
            .send()
            .await
            .map_err(|e| EngineError::TaskExecution(format!("task service unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::TaskExecution(format!(
                "task service returned {}: {}",
                status, text
            )));
        }

        Ok(decode_events(Box::pin(response.bytes_stream())).boxed())
    }
}

struct LineDecoder<S> {
    inner: S,
    buffer: Vec<u8>,
    finished: bool,
}

impl<S> LineDecoder<S> {
    /// Pop the next complete line from the buffer
    fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.buffer.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Take whatever is left once the body has ended
    fn take_rest(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

/// Decode a chunked NDJSON body into task events
pub(crate) fn decode_events<S, B, E>(body: S) -> impl Stream<Item = TaskEvent> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    let decoder = LineDecoder {
        inner: body,
        buffer: Vec::new(),
        finished: false,
    };

    stream::unfold(decoder, |mut state| async move {
        loop {
            while let Some(line) = state.next_line() {
                if let Some(event) = parse_line(&line) {
                    return Some((event, state));
                }
            }

            if state.finished {
                let event = state.take_rest().and_then(|rest| parse_line(&rest))?;
                return Some((event, state));
            }

            match state.inner.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    state.finished = true;
                    state.buffer.clear();
                    return Some((
                        TaskEvent::error(format!("task stream interrupted: {}", e)),
                        state,
                    ));
                }
                None => state.finished = true,
            }
        }
    })
}

fn parse_line(line: &str) -> Option<TaskEvent> {
    let line = line.trim();
    let line = line.strip_prefix("data:").map(str::trim).unwrap_or(line);
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<TaskEvent>(line) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!("Skipping unrecognized task event line: {}", e);
            None
        }
    }
}
