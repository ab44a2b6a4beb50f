// Repopulse repository health agent
// Main entry point for the repopulse binary

use clap::Parser;
use repopulse_engine::cli::{Cli, Command, MemoryAction};
use repopulse_engine::config::Config;
use repopulse_engine::handlers::{
    handle_memory_clear, handle_memory_show, handle_run, handle_serve, OutputFormat,
};
use repopulse_engine::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log wins over the configured level; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry(log_level);

    tracing::info!(
        "Repopulse v{} ({} - {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    match cli.command {
        Command::Run {
            repo,
            mode,
            scenario,
            task,
        } => handle_run(repo, mode, scenario, task, &config, format).await,

        Command::Serve { bind } => handle_serve(bind, &config).await,

        Command::Memory { action } => match action {
            MemoryAction::Show { repo } => handle_memory_show(repo, &config, format).await,
            MemoryAction::Clear { repo } => handle_memory_clear(repo, &config, format).await,
        },
    }
}
