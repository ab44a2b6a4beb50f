//! Message Bus for run observability
//!
//! The MessageBus provides a pub/sub channel for run lifecycle events: runs
//! starting and finishing, tools the agent invoked, errors reported
//! mid-stream, and persistence that degraded. Subscribers (the API server,
//! tests) never influence control flow.
//!
//! Channels are bounded. Publishing never waits: an event for a subscriber
//! whose channel is full or closed is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Channel buffer size for bounded channels
const CHANNEL_BUFFER_SIZE: usize = 100;

/// Event types that can be published on the message bus
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum EventType {
    /// A health-check run has started
    RunStarted,
    /// A tool was invoked by the agent
    ToolUsed,
    /// The task service reported an error mid-stream
    TaskError,
    /// A run finished and produced a report
    RunCompleted,
    /// A run failed before producing a report
    RunFailed,
    /// Local or remote memory persistence degraded
    PersistenceDegraded,
    /// Subscribe to all event types
    All,
}

/// Events that can be published on the message bus
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RunStarted {
        run_id: String,
        repo: String,
        scenario: String,
        mode: String,
    },
    ToolUsed {
        run_id: String,
        tool: String,
    },
    TaskError {
        run_id: String,
        message: String,
    },
    RunCompleted {
        run_id: String,
        repo: String,
        score: Option<u8>,
    },
    RunFailed {
        run_id: String,
        repo: String,
        error: String,
    },
    PersistenceDegraded {
        run_id: String,
        target: String,
        reason: String,
    },
}

impl Event {
    /// Get the event type for this event
    pub fn event_type(&self) -> EventType {
        match self {
            Event::RunStarted { .. } => EventType::RunStarted,
            Event::ToolUsed { .. } => EventType::ToolUsed,
            Event::TaskError { .. } => EventType::TaskError,
            Event::RunCompleted { .. } => EventType::RunCompleted,
            Event::RunFailed { .. } => EventType::RunFailed,
            Event::PersistenceDegraded { .. } => EventType::PersistenceDegraded,
        }
    }
}

/// Message bus for pub/sub communication between components
pub struct MessageBus {
    /// Map of event types to lists of subscribers
    channels: Arc<Mutex<HashMap<EventType, Vec<mpsc::Sender<Event>>>>>,
}

impl MessageBus {
    /// Create a new MessageBus
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Subscribe to a specific event type, or `EventType::All`
    pub async fn subscribe(&self, event_type: EventType) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let mut channels = self.channels.lock().await;
        channels.entry(event_type).or_default().push(tx);
        rx
    }

    /// Publish an event to all subscribers
    ///
    /// The event goes to subscribers of its type and to `EventType::All`
    /// subscribers. Closed subscribers are pruned.
    pub async fn publish(&self, event: Event) {
        let mut channels = self.channels.lock().await;
        let event_type = event.event_type();

        for key in [event_type, EventType::All] {
            if let Some(subscribers) = channels.get_mut(&key) {
                subscribers.retain(|tx| !tx.is_closed());
                for tx in subscribers.iter() {
                    // Full channel: drop the event for that subscriber
                    let _ = tx.try_send(event.clone());
                }
            }
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}
