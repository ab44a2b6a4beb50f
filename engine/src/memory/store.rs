//! Local Memory Store
//!
//! One JSON document per repository under the memory directory, named after
//! the identity's storage key (`owner__name.json`).
//!
//! - The directory is created lazily on first save
//! - A missing document loads as `None`
//! - An unreadable or malformed document loads as `Degraded`, never as an error
//! - Saves replace the whole document (temp file + rename)

use sdk::errors::EngineError;
use sdk::types::RepoId;
use sdk::Outcome;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::RepoMemory;

/// File-backed store of [`RepoMemory`] documents
#[derive(Debug, Clone)]
pub struct LocalMemoryStore {
    root: PathBuf,
}

impl LocalMemoryStore {
    /// Create a store rooted at `root`; nothing is touched on disk yet
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the documents
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for `repo`
    pub fn path_for(&self, repo: &RepoId) -> PathBuf {
        self.root.join(format!("{}.json", repo.storage_key()))
    }

    /// Load the document for `repo`
    ///
    /// Returns `Ok(None)` when no document exists and `Degraded` when the
    /// document cannot be read or parsed.
    pub async fn load(&self, repo: &RepoId) -> Outcome<Option<RepoMemory>> {
        let path = self.path_for(repo);

        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(repo = %repo, "No memory document yet");
                return Outcome::Ok(None);
            }
            Err(e) => {
                return Outcome::degraded_by(EngineError::Storage(format!(
                    "failed to read memory document for {}: {}",
                    repo, e
                )))
            }
        };

        match serde_json::from_str::<RepoMemory>(&contents) {
            Ok(memory) => {
                debug!(repo = %repo, episodes = memory.episodic.len(), "Loaded memory document");
                Outcome::Ok(Some(memory))
            }
            Err(e) => Outcome::degraded_by(EngineError::CorruptDocument(format!(
                "malformed memory document for {}: {}",
                repo, e
            ))),
        }
    }

    /// Replace the document for `repo`
    pub async fn save(&self, repo: &RepoId, memory: &RepoMemory) -> Outcome<()> {
        if let Err(e) = fs::create_dir_all(&self.root).await {
            return Outcome::degraded_by(EngineError::Storage(format!(
                "failed to create memory directory {:?}: {}",
                self.root, e
            )));
        }

        let json = match serde_json::to_string_pretty(memory) {
            Ok(json) => json,
            Err(e) => {
                return Outcome::degraded_by(EngineError::Storage(format!(
                    "failed to serialize memory for {}: {}",
                    repo, e
                )))
            }
        };

        let path = self.path_for(repo);
        let tmp = self.root.join(format!(
            ".{}.{}.tmp",
            repo.storage_key(),
            uuid::Uuid::new_v4().simple()
        ));

        if let Err(e) = fs::write(&tmp, json).await {
            return Outcome::degraded_by(EngineError::Storage(format!(
                "failed to write memory for {}: {}",
                repo, e
            )));
        }

        if let Err(e) = fs::rename(&tmp, &path).await {
            fs::remove_file(&tmp).await.ok();
            return Outcome::degraded_by(EngineError::Storage(format!(
                "failed to replace memory for {}: {}",
                repo, e
            )));
        }

        debug!(repo = %repo, path = ?path, "Saved memory document");
        Outcome::Ok(())
    }

    /// Delete the document for `repo`; `Ok(false)` if there was none
    pub async fn remove(&self, repo: &RepoId) -> Outcome<bool> {
        match fs::remove_file(self.path_for(repo)).await {
            Ok(()) => Outcome::Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Outcome::Ok(false),
            Err(e) => Outcome::degraded_by(EngineError::Storage(format!(
                "failed to remove memory for {}: {}",
                repo, e
            ))),
        }
    }
}
