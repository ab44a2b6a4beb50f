//! CLI interface for Repopulse
//!
//! Command-line interface built with clap's derive API.

use clap::{Parser, Subcommand};
use sdk::types::{Mode, Scenario};
use std::path::PathBuf;

/// Repopulse repository health agent
///
/// Runs memory-augmented health checks against GitHub repositories through
/// a task execution service, on demand or on a daily schedule.
#[derive(Parser, Debug)]
#[command(name = "repopulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one health check now
    Run {
        /// Repository slug, URL or host-prefixed path
        repo: String,

        /// Autonomy mode (plan, auto)
        #[arg(long, default_value = "plan")]
        mode: Mode,

        /// Scenario (health, backlog, release, custom, chat)
        #[arg(long, default_value = "health")]
        scenario: Scenario,

        /// Free-text task for the agent
        #[arg(long)]
        task: Option<String>,
    },

    /// Serve the HTTP API and the daily schedule
    Serve {
        /// Override the configured bind address
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Inspect or reset stored repository memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
}

/// Repository memory actions
#[derive(Subcommand, Debug)]
pub enum MemoryAction {
    /// Show the stored memory document
    Show {
        /// Repository slug, URL or host-prefixed path
        repo: String,
    },

    /// Delete the stored memory document
    Clear {
        /// Repository slug, URL or host-prefixed path
        repo: String,
    },
}
