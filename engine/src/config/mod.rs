//! Configuration management
//!
//! This module handles loading, validation, and management of the Repopulse
//! configuration. Configuration is stored in TOML format at
//! ~/.repopulse/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **executor**: Task execution service endpoint, model, iteration ceiling,
//!   credential variable and the repository-inspection tool server
//! - **memory_service**: Remote memory service endpoint (optional)
//! - **schedule**: Daily recurring run (optional)
//! - **api**: HTTP request surface bind address
//!
//! Credentials never live in the file. The executor API key is read from the
//! environment variable named by `executor.api_key_env`; a missing key is a
//! configuration error raised before any run starts.
//!
//! # Examples
//!
//! ```no_run
//! use repopulse_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Data dir: {:?}", config.core.data_dir);
//! println!("Model: {}", config.executor.model);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use sdk::types::{RepoId, Scenario};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    pub core: CoreConfig,

    /// Task execution service settings
    pub executor: ExecutorConfig,

    /// Remote memory service settings
    #[serde(default)]
    pub memory_service: MemoryServiceConfig,

    /// Recurring run settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// HTTP request surface settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Task execution service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Base URL of the task execution service
    #[serde(default = "default_executor_base_url")]
    pub base_url: String,

    /// Model identifier passed with every submission
    #[serde(default = "default_model")]
    pub model: String,

    /// Plan/act/observe cycle ceiling enforced by the service
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Environment variable holding the service API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Repository-inspection capability provider
    #[serde(default)]
    pub tool_server: ToolServerConfig,
}

/// Repository-inspection tool server attached to every task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolServerConfig {
    /// Name the task service knows the tool server by
    #[serde(default = "default_tool_server_name")]
    pub name: String,

    /// Tool server endpoint
    #[serde(default = "default_tool_server_url")]
    pub url: String,
}

/// Remote memory service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryServiceConfig {
    /// Consult and update the remote memory service
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the memory service
    #[serde(default = "default_memory_service_url")]
    pub base_url: String,
}

/// Daily recurring run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Register the daily trigger when serving
    #[serde(default)]
    pub enabled: bool,

    /// Repository checked by the scheduled run
    #[serde(default)]
    pub repo: Option<String>,

    /// Scenario used by the scheduled run
    #[serde(default)]
    pub scenario: Scenario,

    /// Hour of day (UTC) the trigger fires
    #[serde(default = "default_schedule_hour")]
    pub hour_utc: u32,

    /// Minute of hour (UTC) the trigger fires
    #[serde(default)]
    pub minute_utc: u32,
}

/// HTTP request surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Socket address the API server binds to
    #[serde(default = "default_api_bind")]
    pub bind: String,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.repopulse")
}

fn default_executor_base_url() -> String {
    "http://localhost:8700".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_max_iterations() -> u32 {
    24
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_tool_server_name() -> String {
    "github".to_string()
}

fn default_tool_server_url() -> String {
    "http://localhost:8701/mcp".to_string()
}

fn default_memory_service_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_schedule_hour() -> u32 {
    9
}

fn default_api_bind() -> String {
    "127.0.0.1:8787".to_string()
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            base_url: default_executor_base_url(),
            model: default_model(),
            max_iterations: default_max_iterations(),
            api_key_env: default_api_key_env(),
            tool_server: ToolServerConfig::default(),
        }
    }
}

impl Default for ToolServerConfig {
    fn default() -> Self {
        Self {
            name: default_tool_server_name(),
            url: default_tool_server_url(),
        }
    }
}

impl Default for MemoryServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_memory_service_url(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            repo: None,
            scenario: Scenario::Health,
            hour_utc: default_schedule_hour(),
            minute_utc: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_api_bind(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.repopulse/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config = Self::default_config();

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        // Validate a copy so the file keeps the unexpanded ~ paths
        let mut processed = config;
        processed.validate_and_process()?;
        Ok(processed)
    }

    /// Get the default configuration file path (~/.repopulse/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".repopulse").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig {
                log_level: default_log_level(),
                data_dir: default_data_dir(),
            },
            executor: ExecutorConfig::default(),
            memory_service: MemoryServiceConfig::default(),
            schedule: ScheduleConfig::default(),
            api: ApiConfig::default(),
        }
    }

    /// Directory holding per-repository memory documents
    pub fn memory_dir(&self) -> PathBuf {
        self.core.data_dir.join("memory")
    }

    /// Read the executor API key from the configured environment variable
    ///
    /// # Errors
    ///
    /// Returns `EngineError::MissingCredential` if the variable is unset or blank.
    pub fn executor_api_key(&self) -> Result<String, EngineError> {
        match std::env::var(&self.executor.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(EngineError::MissingCredential(
                self.executor.api_key_env.clone(),
            )),
        }
    }

    /// Repository targeted by the scheduled run, if scheduling is enabled
    pub fn scheduled_repo(&self) -> Result<Option<RepoId>, EngineError> {
        if !self.schedule.enabled {
            return Ok(None);
        }
        let repo = self.schedule.repo.as_deref().ok_or_else(|| {
            EngineError::Config("schedule.repo is required when scheduling is enabled".to_string())
        })?;
        RepoId::parse(repo)
            .map(Some)
            .map_err(|e| EngineError::Config(format!("Invalid schedule.repo: {}", e)))
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates the log level, URLs and numeric ranges
    /// - Validates the scheduled repository when scheduling is enabled
    /// - Expands ~ in the data directory
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        for (field, url) in [
            ("executor.base_url", &self.executor.base_url),
            ("executor.tool_server.url", &self.executor.tool_server.url),
            ("memory_service.base_url", &self.memory_service.base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(EngineError::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    field, url
                )));
            }
        }

        if self.executor.model.trim().is_empty() {
            return Err(EngineError::Config("executor.model must not be empty".to_string()));
        }

        if self.executor.max_iterations == 0 {
            return Err(EngineError::Config(
                "executor.max_iterations must be at least 1".to_string(),
            ));
        }

        if self.schedule.hour_utc > 23 || self.schedule.minute_utc > 59 {
            return Err(EngineError::Config(
                "schedule.hour_utc must be 0-23 and schedule.minute_utc 0-59".to_string(),
            ));
        }
        self.scheduled_repo()?;

        self.api.bind.parse::<SocketAddr>().map_err(|e| {
            EngineError::Config(format!("Invalid api.bind '{}': {}", self.api.bind, e))
        })?;

        self.core.data_dir = expand_path(&self.core.data_dir)?;

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
