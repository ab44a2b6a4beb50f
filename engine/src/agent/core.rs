//! Health Agent
//!
//! The orchestration façade behind every entry point (CLI, HTTP, scheduler).
//! One call to [`HealthAgent::check`] walks a fixed sequence:
//!
//! 1. Normalize the repository identity
//! 2. Load local memory (corrupt or unreadable memory counts as absent)
//! 3. Resolve autonomy (`chat` always runs in `auto`)
//! 4. Recall remote context, best effort
//! 5. Compose the instruction payload
//! 6. Run the task loop to stream exhaustion
//! 7. Extract the health score
//! 8. Persist an episode locally and a digest remotely, best effort
//!
//! Only input errors and a task that cannot be submitted fail the call.
//! Everything after the task loop is logged and never changes the result.

use serde::{Deserialize, Serialize};
use sdk::errors::EngineError;
use sdk::types::{Mode, RepoId, Scenario};
use sdk::Outcome;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::executor::HttpTaskExecutor;
use crate::memory::{self, Episode, HttpMemoryGateway, LocalMemoryStore, RemoteMemory, RepoMemory};
use crate::message_bus::{Event, MessageBus};
use crate::prompt::{self, TaskRunContext};
use crate::score::extract_score;

use super::task_loop::TaskLoop;

/// One health-check invocation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HealthCheckRequest {
    /// Repository in any accepted form (slug, URL, host-prefixed)
    pub repo: String,

    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub scenario: Scenario,

    #[serde(default)]
    pub task: Option<String>,
}

impl HealthCheckRequest {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            ..Default::default()
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = scenario;
        self
    }

    pub fn task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }
}

/// Result of one health-check run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    /// Normalized repository identity
    pub repo: RepoId,

    /// Effective mode the task ran in
    pub mode: Mode,

    pub scenario: Scenario,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,

    /// Trimmed report text
    pub report: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
}

/// Mode a run actually executes in
///
/// `chat` is fully agentic and always runs in `auto`; every other scenario
/// keeps the requested mode.
pub fn effective_mode(requested: Mode, scenario: Scenario) -> Mode {
    match scenario {
        Scenario::Chat => Mode::Auto,
        _ => requested,
    }
}

/// Orchestration façade for repository health checks
pub struct HealthAgent {
    store: LocalMemoryStore,
    remote: Option<Arc<dyn RemoteMemory>>,
    task_loop: TaskLoop,
    bus: Option<Arc<MessageBus>>,
}

impl HealthAgent {
    pub fn new(store: LocalMemoryStore, task_loop: TaskLoop) -> Self {
        Self {
            store,
            remote: None,
            task_loop,
            bus: None,
        }
    }

    /// Consult and update a remote memory service
    pub fn with_remote(mut self, remote: Arc<dyn RemoteMemory>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Publish run lifecycle events on `bus`
    pub fn with_bus(mut self, bus: Arc<MessageBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Wire the agent from configuration
    ///
    /// # Errors
    ///
    /// Returns `EngineError::MissingCredential` when the executor API key is
    /// not available.
    pub fn from_config(config: &Config, bus: Arc<MessageBus>) -> Result<Self, EngineError> {
        let api_key = config.executor_api_key()?;
        let executor = Arc::new(HttpTaskExecutor::new(&config.executor.base_url, api_key));

        let task_loop = TaskLoop::new(
            executor,
            &config.executor.model,
            config.executor.max_iterations,
        )
        .with_tool_server(config.executor.tool_server.clone())
        .with_bus(bus.clone());

        let mut agent =
            Self::new(LocalMemoryStore::new(config.memory_dir()), task_loop).with_bus(bus);

        if config.memory_service.enabled {
            agent = agent.with_remote(Arc::new(HttpMemoryGateway::new(
                &config.memory_service.base_url,
            )));
        }

        Ok(agent)
    }

    /// Local memory store backing this agent
    pub fn store(&self) -> &LocalMemoryStore {
        &self.store
    }

    /// Run one health check
    ///
    /// # Errors
    ///
    /// - `InvalidRepository` when the repository cannot be normalized
    /// - `TaskExecution` when the task could not be submitted
    pub async fn check(&self, request: HealthCheckRequest) -> Result<HealthReport, EngineError> {
        let repo = RepoId::parse(&request.repo)?;
        let run_id = Uuid::new_v4().to_string();
        let mode = effective_mode(request.mode, request.scenario);

        info!(
            run_id = %run_id,
            repo = %repo,
            scenario = %request.scenario,
            mode = %mode,
            "Starting health check"
        );
        self.publish(Event::RunStarted {
            run_id: run_id.clone(),
            repo: repo.to_string(),
            scenario: request.scenario.to_string(),
            mode: mode.to_string(),
        })
        .await;

        let stored = self.load_memory(&repo).await;

        let mut ctx = TaskRunContext {
            repo: repo.clone(),
            mode,
            scenario: request.scenario,
            task: request.task.clone(),
            memory_summary: memory::summarize(stored.as_ref()),
            remote_context: None,
        };
        ctx.remote_context = self.fetch_remote_context(&ctx).await;

        let instructions = prompt::compose(&ctx);
        debug!(run_id = %run_id, len = instructions.len(), "Composed instructions");

        let transcript = match self.task_loop.run(&run_id, instructions).await {
            Outcome::Ok(transcript) => transcript,
            Outcome::Degraded(reason) => {
                return Err(self
                    .fail(&run_id, &repo, EngineError::TaskExecution(reason))
                    .await)
            }
            Outcome::Fatal(e) => return Err(self.fail(&run_id, &repo, e).await),
        };

        let score = extract_score(&transcript.text);
        if score.is_none() {
            warn!(run_id = %run_id, repo = %repo, "Report carries no health score");
        }

        self.persist(&run_id, &ctx, stored, score, &transcript.text)
            .await;

        info!(run_id = %run_id, repo = %repo, score = ?score, "Health check complete");
        self.publish(Event::RunCompleted {
            run_id,
            repo: repo.to_string(),
            score,
        })
        .await;

        Ok(HealthReport {
            repo,
            mode,
            scenario: request.scenario,
            task: request.task,
            report: transcript.text,
            score,
        })
    }

    async fn load_memory(&self, repo: &RepoId) -> Option<RepoMemory> {
        match self.store.load(repo).await {
            Outcome::Ok(memory) => memory,
            Outcome::Degraded(reason) => {
                warn!(repo = %repo, "Treating stored memory as absent: {}", reason);
                None
            }
            Outcome::Fatal(e) => {
                warn!(repo = %repo, "Treating stored memory as absent: {}", e);
                None
            }
        }
    }

    async fn fetch_remote_context(&self, ctx: &TaskRunContext) -> Option<String> {
        let remote = self.remote.as_ref()?;
        let conversation = prompt::conversation_digest(ctx);

        match remote.fetch_context(&ctx.repo, &conversation).await {
            Outcome::Ok(context) => Some(context),
            Outcome::Degraded(reason) => {
                warn!(repo = %ctx.repo, "Continuing with local memory only: {}", reason);
                None
            }
            Outcome::Fatal(e) => {
                warn!(repo = %ctx.repo, "Continuing with local memory only: {}", e);
                None
            }
        }
    }

    /// Save the episode locally and push the digest remotely; both are
    /// attempted regardless of the other's result.
    async fn persist(
        &self,
        run_id: &str,
        ctx: &TaskRunContext,
        stored: Option<RepoMemory>,
        score: Option<u8>,
        report: &str,
    ) {
        let mut document = stored.unwrap_or_default();
        document.push_episode(Episode::new(score, report));

        match self.store.save(&ctx.repo, &document).await {
            Outcome::Ok(()) => debug!(
                repo = %ctx.repo,
                episodes = document.episodic.len(),
                "Saved local memory"
            ),
            Outcome::Degraded(reason) => self.persistence_degraded(run_id, "local", reason).await,
            Outcome::Fatal(e) => self.persistence_degraded(run_id, "local", e.to_string()).await,
        }

        if let Some(remote) = &self.remote {
            let digest = prompt::run_digest(&ctx.repo, ctx.scenario, ctx.mode, score, report);
            match remote.push_memory(&ctx.repo, &digest).await {
                Outcome::Ok(()) => debug!(repo = %ctx.repo, "Pushed remote memory"),
                Outcome::Degraded(reason) => {
                    self.persistence_degraded(run_id, "remote", reason).await
                }
                Outcome::Fatal(e) => {
                    self.persistence_degraded(run_id, "remote", e.to_string())
                        .await
                }
            }
        }
    }

    async fn persistence_degraded(&self, run_id: &str, target: &str, reason: String) {
        warn!(run_id, target, "Memory persistence degraded: {}", reason);
        self.publish(Event::PersistenceDegraded {
            run_id: run_id.to_string(),
            target: target.to_string(),
            reason,
        })
        .await;
    }

    async fn fail(&self, run_id: &str, repo: &RepoId, error: EngineError) -> EngineError {
        self.publish(Event::RunFailed {
            run_id: run_id.to_string(),
            repo: repo.to_string(),
            error: error.to_string(),
        })
        .await;
        error
    }

    async fn publish(&self, event: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(event).await;
        }
    }
}
