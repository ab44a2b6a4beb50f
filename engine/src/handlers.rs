//! Command handlers for CLI operations
//!
//! - run: Execute one health check and print the report
//! - serve: Run the HTTP API and the daily schedule until Ctrl-C
//! - memory show: Print a repository's stored memory
//! - memory clear: Delete a repository's stored memory

use anyhow::{Context, Result};
use sdk::errors::PulseErrorExt;
use sdk::types::{Mode, RepoId, Scenario};
use sdk::Outcome;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::agent::{HealthAgent, HealthCheckRequest};
use crate::api::ApiServer;
use crate::config::Config;
use crate::memory::LocalMemoryStore;
use crate::message_bus::{Event, EventType, MessageBus};
use crate::scheduler::Scheduler;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Run one health check and print its report
pub async fn handle_run(
    repo: String,
    mode: Mode,
    scenario: Scenario,
    task: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let bus = Arc::new(MessageBus::new());
    let agent = HealthAgent::from_config(config, bus)?;

    let mut request = HealthCheckRequest::new(repo).mode(mode).scenario(scenario);
    request.task = task;

    let report = match agent.check(request).await {
        Ok(report) => report,
        Err(e) => anyhow::bail!("{}\nHint: {}", e, e.user_hint()),
    };

    match format {
        OutputFormat::Text => {
            println!("{} ({}, {})", report.repo, report.scenario, report.mode);
            println!();
            println!("{}", report.report);
            if report.score.is_none() {
                println!();
                println!("(no health score found in the report)");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Serve the HTTP API, and the daily schedule when enabled, until Ctrl-C
pub async fn handle_serve(bind: Option<String>, config: &Config) -> Result<()> {
    let bus = Arc::new(MessageBus::new());
    let events = bus.subscribe(EventType::All).await;
    let event_logger = tokio::spawn(log_events(events));

    let agent = Arc::new(HealthAgent::from_config(config, bus)?);

    let scheduler = Scheduler::from_config(config, agent.clone())?.map(Scheduler::spawn);

    let bind = bind.unwrap_or_else(|| config.api.bind.clone());
    let server = ApiServer::start(&bind, agent).await?;
    println!("Repopulse API listening on http://{}", server.local_addr());
    if scheduler.is_some() {
        println!(
            "Daily run scheduled at {:02}:{:02} UTC",
            config.schedule.hour_utc, config.schedule.minute_utc
        );
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    tracing::info!("Shutdown requested");

    if let Some(handle) = scheduler {
        handle.abort();
    }
    server.shutdown().await;
    event_logger.abort();

    Ok(())
}

/// Print the stored memory document for `repo`
pub async fn handle_memory_show(repo: String, config: &Config, format: OutputFormat) -> Result<()> {
    let repo = RepoId::parse(&repo)?;
    let store = LocalMemoryStore::new(config.memory_dir());

    let memory = match store.load(&repo).await {
        Outcome::Ok(memory) => memory,
        Outcome::Degraded(reason) => anyhow::bail!("Cannot read memory for {}: {}", repo, reason),
        Outcome::Fatal(e) => return Err(e.into()),
    };

    match (format, memory) {
        (OutputFormat::Json, Some(memory)) => {
            println!("{}", serde_json::to_string_pretty(&memory)?);
        }
        (OutputFormat::Json, None) => {
            println!("{}", json!({ "repo": repo, "memory": null }));
        }
        (OutputFormat::Text, Some(memory)) => {
            println!("Memory for {} ({})", repo, store.path_for(&repo).display());
            println!();
            println!("{}", memory.summary());
        }
        (OutputFormat::Text, None) => {
            println!("No memory stored for {}.", repo);
        }
    }

    Ok(())
}

/// Delete the stored memory document for `repo`
pub async fn handle_memory_clear(repo: String, config: &Config, format: OutputFormat) -> Result<()> {
    let repo = RepoId::parse(&repo)?;
    let store = LocalMemoryStore::new(config.memory_dir());

    let removed = match store.remove(&repo).await {
        Outcome::Ok(removed) => removed,
        Outcome::Degraded(reason) => anyhow::bail!("Cannot clear memory for {}: {}", repo, reason),
        Outcome::Fatal(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Text if removed => println!("Cleared memory for {}.", repo),
        OutputFormat::Text => println!("No memory stored for {}.", repo),
        OutputFormat::Json => println!("{}", json!({ "repo": repo, "removed": removed })),
    }

    Ok(())
}

async fn log_events(mut events: mpsc::Receiver<Event>) {
    while let Some(event) = events.recv().await {
        tracing::debug!(?event, "Run event");
    }
}
