//! Repository Memory
//!
//! Per-repository memory carried between runs:
//!
//! - **core**: long-lived description and ownership, written rarely, read every run
//! - **procedural**: named advisory policies (triage, release)
//! - **episodic**: the 10 most recent runs, oldest evicted first
//!
//! The document lives on disk through [`LocalMemoryStore`] and is mirrored on a
//! best-effort basis to a remote memory service through [`RemoteMemory`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::VecDeque;

pub mod remote;
pub mod store;

pub use remote::{HttpMemoryGateway, RemoteMemory};
pub use store::LocalMemoryStore;

/// Maximum number of episodes kept per repository
pub const MAX_EPISODES: usize = 10;

/// Maximum characters of a run result kept in an episode summary
pub const EPISODE_SUMMARY_CHARS: usize = 2000;

/// Characters of each episode shown in the prompt memory summary
const SUMMARY_PREVIEW_CHARS: usize = 240;

/// Text used when a repository has no stored memory
pub const NO_MEMORY: &str = "No prior memory for this repository.";

/// Persistent memory document for one repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoMemory {
    /// Long-lived facts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<CoreFacts>,

    /// Advisory policies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedural: Option<ProceduralPolicies>,

    /// Most recent runs, oldest first
    #[serde(default)]
    pub episodic: VecDeque<Episode>,
}

/// Long-lived repository facts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreFacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<String>,
}

/// Named free-text policies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProceduralPolicies {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
}

/// Record of one past run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "healthScore", default, deserialize_with = "lenient_score")]
    pub health_score: Option<u8>,

    #[serde(default)]
    pub summary: String,
}

impl Episode {
    /// Build an episode stamped now, keeping the first
    /// [`EPISODE_SUMMARY_CHARS`] characters of the run result.
    pub fn new(health_score: Option<u8>, result: &str) -> Self {
        Self::at(Utc::now(), health_score, result)
    }

    /// Build an episode with an explicit timestamp
    pub fn at(timestamp: DateTime<Utc>, health_score: Option<u8>, result: &str) -> Self {
        Self {
            timestamp,
            health_score,
            summary: truncate_chars(result, EPISODE_SUMMARY_CHARS),
        }
    }
}

impl RepoMemory {
    /// Append an episode, evicting the oldest entries beyond [`MAX_EPISODES`]
    pub fn push_episode(&mut self, episode: Episode) {
        self.episodic.push_back(episode);
        while self.episodic.len() > MAX_EPISODES {
            self.episodic.pop_front();
        }
    }

    /// Most recent episode, if any
    pub fn latest_episode(&self) -> Option<&Episode> {
        self.episodic.back()
    }

    /// Render the memory as prompt context
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        if let Some(core) = &self.core {
            if let Some(description) = &core.description {
                lines.push(format!("Description: {}", description.trim()));
            }
            if !core.owners.is_empty() {
                lines.push(format!("Owners: {}", core.owners.join(", ")));
            }
        }

        if let Some(procedural) = &self.procedural {
            if let Some(triage) = &procedural.triage {
                lines.push(format!("Triage policy: {}", triage.trim()));
            }
            if let Some(release) = &procedural.release {
                lines.push(format!("Release policy: {}", release.trim()));
            }
        }

        if !self.episodic.is_empty() {
            lines.push(format!(
                "Previous runs ({}, newest first):",
                self.episodic.len()
            ));
            for episode in self.episodic.iter().rev() {
                let score = episode
                    .health_score
                    .map(|s| format!("{}/100", s))
                    .unwrap_or_else(|| "n/a".to_string());
                let preview = truncate_chars(
                    &episode.summary.split_whitespace().collect::<Vec<_>>().join(" "),
                    SUMMARY_PREVIEW_CHARS,
                );
                lines.push(format!(
                    "- {} | score {} | {}",
                    episode.timestamp.format("%Y-%m-%d %H:%M UTC"),
                    score,
                    preview
                ));
            }
        }

        if lines.is_empty() {
            NO_MEMORY.to_string()
        } else {
            lines.join("\n")
        }
    }
}

/// Summary for an optional document; absence renders as [`NO_MEMORY`]
pub fn summarize(memory: Option<&RepoMemory>) -> String {
    memory
        .map(RepoMemory::summary)
        .unwrap_or_else(|| NO_MEMORY.to_string())
}

/// Any stored number reads as a score clamped to `0..=100`; other values
/// read as no score, so one bad entry never discards the whole history.
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .map(|score| score.round().clamp(0.0, 100.0) as u8))
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
