use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PROJECTS_FILE: &str = "./data/projects.json";
const DEFAULT_LAUNCH_LOG_NAME: &str = "launches.log";
const DEFAULT_LAUNCH_LOG_MAX_SIZE_MB: u64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub projects_file: PathBuf,
    pub terminal: Option<String>,
    pub shell: String,
    pub log_level: String,
    pub log_format: LogFormat,
    pub launch_log_file: PathBuf,
    pub launch_log_max_size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Expands `~` and `$VAR` references in a configured path.
fn expand_path(path_str: &str) -> Result<PathBuf, anyhow::Error> {
    shellexpand::full(path_str)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| anyhow::anyhow!("Failed to expand path '{}': {}", path_str, e))
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let projects_file_str =
            var("PROJECTS_FILE").unwrap_or_else(|| DEFAULT_PROJECTS_FILE.to_string());
        let projects_file = expand_path(&projects_file_str)
            .context(format!("Invalid PROJECTS_FILE: {}", projects_file_str))?;

        let terminal = var("PROJECTS_TERMINAL");
        let shell = var("PROJECTS_SHELL").unwrap_or_else(|| "bash".to_string());

        let log_level = var("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format_str = var("LOG_FORMAT").unwrap_or_else(|| "pretty".to_string());
        let log_format = LogFormat::from_str(&log_format_str)?;

        let launch_log_file = match var("LAUNCH_LOG_FILE") {
            Some(s) => expand_path(&s).context(format!("Invalid LAUNCH_LOG_FILE: {}", s))?,
            None => default_launch_log_file(&projects_file),
        };

        let launch_log_max_size_bytes = var("LAUNCH_LOG_MAX_SIZE_MB")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_LAUNCH_LOG_MAX_SIZE_MB)
            * 1024
            * 1024;

        Ok(Config {
            projects_file,
            terminal,
            shell,
            log_level,
            log_format,
            launch_log_file,
            launch_log_max_size_bytes,
        })
    }

    /// Points the registry at another file. The launch log follows it unless it was set explicitly.
    pub fn with_projects_file(mut self, projects_file: PathBuf) -> Self {
        if self.launch_log_file == default_launch_log_file(&self.projects_file) {
            self.launch_log_file = default_launch_log_file(&projects_file);
        }
        self.projects_file = projects_file;
        self
    }
}

fn default_launch_log_file(projects_file: &std::path::Path) -> PathBuf {
    projects_file
        .parent()
        .map(|dir| dir.join(DEFAULT_LAUNCH_LOG_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LAUNCH_LOG_NAME))
}
