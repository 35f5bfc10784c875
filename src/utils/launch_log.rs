use crate::config::Config;
use anyhow::Result;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::error;

/// Append-only history of launch attempts, rotated once it reaches a size threshold.
#[derive(Debug)]
pub struct LaunchLog {
    log_file_path: PathBuf,
    max_size_bytes: u64,
}

impl LaunchLog {
    pub fn new(config: &Config) -> Self {
        Self::at(config.launch_log_file.clone(), config.launch_log_max_size_bytes)
    }

    /// Nothing touches the disk until the first [`LaunchLog::record`].
    pub fn at(log_file_path: PathBuf, max_size_bytes: u64) -> Self {
        Self {
            log_file_path,
            max_size_bytes,
        }
    }

    fn rotate_log_if_needed(&self) -> Result<()> {
        if !self.log_file_path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(&self.log_file_path)?;
        if metadata.len() >= self.max_size_bytes {
            let timestamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
            let file_stem = self
                .log_file_path
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy();
            let extension = self
                .log_file_path
                .extension()
                .unwrap_or_default()
                .to_string_lossy();

            let mut backup_path = self
                .log_file_path
                .with_file_name(format!("{}_{}.{}", file_stem, timestamp, extension));
            // Several rotations within one second get a numeric suffix
            let mut suffix = 1;
            while backup_path.exists() {
                backup_path = self.log_file_path.with_file_name(format!(
                    "{}_{}_{}.{}",
                    file_stem, timestamp, suffix, extension
                ));
                suffix += 1;
            }

            fs::rename(&self.log_file_path, backup_path)?;
        }
        Ok(())
    }

    /// Records one launch attempt. Write failures are logged and swallowed.
    pub fn record(&self, project_name: &str, outcome: &str) {
        if let Err(e) = self.try_record(project_name, outcome) {
            error!(project = %project_name, error = %e, "Failed to write launch log");
        }
    }

    fn try_record(&self, project_name: &str, outcome: &str) -> Result<()> {
        if let Some(parent_dir) = self.log_file_path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                fs::create_dir_all(parent_dir)?;
            }
        }
        self.rotate_log_if_needed()?;

        let timestamp = Utc::now().to_rfc3339();
        let log_entry = format!("{} | {:<20} | {}\n", timestamp, project_name, outcome);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)?;

        file.write_all(log_entry.as_bytes())?;
        Ok(())
    }
}
