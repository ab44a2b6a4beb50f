//! Integration tests for the daily scheduler

use repopulse_engine::agent::{HealthAgent, TaskLoop};
use repopulse_engine::config::Config;
use repopulse_engine::executor::{Result as ExecResult, TaskEventStream, TaskExecutor, TaskRequest};
use repopulse_engine::memory::LocalMemoryStore;
use repopulse_engine::scheduler::Scheduler;
use async_trait::async_trait;
use futures::{stream, StreamExt};
use sdk::errors::EngineError;
use sdk::types::{Mode, RepoId, Scenario, TaskEvent};
use std::sync::{Arc, Mutex};

struct SilentExecutor;

#[async_trait]
impl TaskExecutor for SilentExecutor {
    fn name(&self) -> &str {
        "silent"
    }

    async fn submit(&self, _request: TaskRequest) -> ExecResult<TaskEventStream> {
        Ok(stream::empty().boxed())
    }
}

/// Refuses the first submission, then replies with a scored report
#[derive(Default)]
struct FlakyExecutor {
    instructions: Mutex<Vec<String>>,
}

#[async_trait]
impl TaskExecutor for FlakyExecutor {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn submit(&self, request: TaskRequest) -> ExecResult<TaskEventStream> {
        let attempt = {
            let mut seen = self.instructions.lock().unwrap();
            seen.push(request.instructions);
            seen.len()
        };

        if attempt == 1 {
            return Err(EngineError::TaskExecution("service restarting".to_string()));
        }
        Ok(stream::iter(vec![TaskEvent::text("Health Score: 64/100\n## Summary\nOk.")]).boxed())
    }
}

fn agent() -> Arc<HealthAgent> {
    let dir = std::env::temp_dir().join("repopulse-scheduler-test");
    Arc::new(HealthAgent::new(
        LocalMemoryStore::new(dir),
        TaskLoop::new(Arc::new(SilentExecutor), "m", 1),
    ))
}

#[test]
fn test_scheduled_runs_are_auto() {
    let scheduler = Scheduler::new(
        agent(),
        RepoId::parse("acme/widgets").unwrap(),
        Scenario::Backlog,
        9,
        0,
    )
    .unwrap();

    let request = scheduler.request();
    assert_eq!(request.repo, "acme/widgets");
    assert_eq!(request.mode, Mode::Auto);
    assert_eq!(request.scenario, Scenario::Backlog);
    assert!(request.task.is_none());
}

#[test]
fn test_invalid_time_is_rejected() {
    let result = Scheduler::new(
        agent(),
        RepoId::parse("acme/widgets").unwrap(),
        Scenario::Health,
        24,
        0,
    );
    assert!(matches!(result, Err(EngineError::Config(_))));
}

#[test]
fn test_from_config() {
    let disabled = Config::default_config();
    assert!(Scheduler::from_config(&disabled, agent()).unwrap().is_none());

    let enabled = Config::from_toml_str(
        r#"
[core]
data_dir = "/tmp/repopulse"

[executor]

[schedule]
enabled = true
repo = "git@github.com:acme/widgets.git"
scenario = "release"
hour_utc = 3
"#,
    )
    .unwrap();

    let scheduler = Scheduler::from_config(&enabled, agent()).unwrap().unwrap();
    let request = scheduler.request();
    assert_eq!(request.repo, "acme/widgets");
    assert_eq!(request.scenario, Scenario::Release);
    assert_eq!(request.mode, Mode::Auto);
}

#[tokio::test]
async fn test_trigger_keeps_firing_after_a_failed_run() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(FlakyExecutor::default());
    let agent = Arc::new(HealthAgent::new(
        LocalMemoryStore::new(dir.path()),
        TaskLoop::new(executor.clone(), "m", 1),
    ));
    let scheduler = Scheduler::new(
        agent.clone(),
        RepoId::parse("acme/widgets").unwrap(),
        Scenario::Health,
        9,
        0,
    )
    .unwrap();

    scheduler.fire().await.unwrap();
    scheduler.fire().await.unwrap();

    let instructions = executor.instructions.lock().unwrap().clone();
    assert_eq!(instructions.len(), 2);
    for text in &instructions {
        assert!(text.contains("## Autonomy: AUTO"));
        assert!(!text.contains("## Autonomy: PLAN"));
    }

    let repo = RepoId::parse("acme/widgets").unwrap();
    let memory = agent.store().load(&repo).await.ok().flatten().unwrap();
    assert_eq!(memory.episodic.len(), 1);
    assert_eq!(memory.episodic[0].health_score, Some(64));
}
