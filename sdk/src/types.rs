//! Shared domain types
//!
//! Repository identities, autonomy modes, scenarios and the task event
//! vocabulary spoken by the task execution service.

use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical `owner/name` repository identity
///
/// Built only through [`RepoId::parse`], so a value always holds exactly two
/// non-empty segments. Case is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    /// Normalize free-form input into a repository identity.
    ///
    /// Accepts a bare `owner/name` slug, a full URL
    /// (`https://github.com/owner/name.git`), a host-prefixed path
    /// (`github.com/owner/name`) or an scp-style remote
    /// (`git@github.com:owner/name.git`). URLs that point deeper into the
    /// repository keep only the two segments after the host.
    pub fn parse(input: &str) -> Result<Self, EngineError> {
        let invalid = || EngineError::InvalidRepository(input.to_string());

        let mut rest = input.trim();
        if rest.is_empty() {
            return Err(invalid());
        }

        let mut has_host = false;
        if let Some(idx) = rest.find("://") {
            rest = &rest[idx + 3..];
            has_host = true;
        } else if let Some(stripped) = rest.strip_prefix("git@") {
            rest = stripped.split_once(':').map(|(_, path)| path).ok_or_else(invalid)?;
        }

        // Drop query string and fragment
        if let Some(idx) = rest.find(|c: char| c == '?' || c == '#') {
            rest = &rest[..idx];
        }

        rest = rest.trim_end_matches('/');
        while let Some(stripped) = rest.strip_suffix(".git") {
            rest = stripped.trim_end_matches('/');
        }

        let segments: Vec<&str> = rest.split('/').collect();
        let (owner, name) = if has_host || (segments.len() > 2 && is_host(segments[0])) {
            // Web URLs may point inside the repository (`/tree/main`, `/pull/3`)
            match &segments[1..] {
                [owner, name, ..] => (*owner, name.trim_end_matches(".git")),
                _ => return Err(invalid()),
            }
        } else {
            match segments[..] {
                [owner, name] => (owner, name),
                _ => return Err(invalid()),
            }
        };

        if is_valid_owner(owner) && is_valid_name(name) {
            Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            })
        } else {
            Err(invalid())
        }
    }

    /// Repository owner (user or organization)
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filesystem-safe key for this identity (`owner__name`)
    ///
    /// Owners never contain underscores, so the key is unambiguous.
    pub fn storage_key(&self) -> String {
        format!("{}__{}", self.owner, self.name)
    }
}

fn is_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':')
}

fn is_valid_owner(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_valid_name(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RepoId {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RepoId> for String {
    fn from(id: RepoId) -> Self {
        id.to_string()
    }
}

/// Autonomy mode for a task run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Read-only diagnosis
    #[default]
    Plan,

    /// Bounded low-risk write actions permitted
    Auto,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Plan => "plan",
            Mode::Auto => "auto",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plan" => Ok(Mode::Plan),
            "auto" => Ok(Mode::Auto),
            other => Err(EngineError::InvalidParameter {
                name: "mode".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Focus template selecting what a run emphasizes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Overall repository health
    #[default]
    Health,

    /// Issue and pull request backlog
    Backlog,

    /// Release readiness
    Release,

    /// Caller-defined focus, driven by the user task
    Custom,

    /// Fully agentic conversation
    Chat,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::Health,
        Scenario::Backlog,
        Scenario::Release,
        Scenario::Custom,
        Scenario::Chat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Health => "health",
            Scenario::Backlog => "backlog",
            Scenario::Release => "release",
            Scenario::Custom => "custom",
            Scenario::Chat => "chat",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.as_str() == wanted)
            .ok_or(EngineError::InvalidParameter {
                name: "scenario".to_string(),
                value: wanted,
            })
    }
}

/// One event streamed by the task execution service
///
/// Only `Text` and `Error` influence orchestration; the rest are
/// informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    /// Output fragment, concatenated in arrival order
    Text { content: String },

    /// The agent invoked a tool
    ToolUse {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Input passed to the most recent tool invocation
    ToolUseInput {
        #[serde(default)]
        input: serde_json::Value,
    },

    /// Result returned by a tool
    ToolResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default)]
        content: serde_json::Value,
    },

    /// The service recorded a checkpoint
    Checkpoint {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// The service rolled back to a checkpoint
    CheckpointRestored {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Complete message object, informational
    Message {
        #[serde(default)]
        content: serde_json::Value,
    },

    /// Non-terminal error reported mid-stream
    Error { message: String },
}

impl TaskEvent {
    pub fn text(content: impl Into<String>) -> Self {
        TaskEvent::Text {
            content: content.into(),
        }
    }

    pub fn tool_use(name: impl Into<String>) -> Self {
        TaskEvent::ToolUse {
            name: name.into(),
            id: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        TaskEvent::Error {
            message: message.into(),
        }
    }

    /// Wire tag of this event
    pub fn kind(&self) -> &'static str {
        match self {
            TaskEvent::Text { .. } => "text",
            TaskEvent::ToolUse { .. } => "tool_use",
            TaskEvent::ToolUseInput { .. } => "tool_use_input",
            TaskEvent::ToolResult { .. } => "tool_result",
            TaskEvent::Checkpoint { .. } => "checkpoint",
            TaskEvent::CheckpointRestored { .. } => "checkpoint_restored",
            TaskEvent::Message { .. } => "message",
            TaskEvent::Error { .. } => "error",
        }
    }
}
