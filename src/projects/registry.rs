use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// One registered project: where to run and what to run there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub name: String,
    pub path: String,
    pub command: String,
}

impl ProjectRecord {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            command: command.into(),
        }
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("path", &self.path),
            ("command", &self.command),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// Ordered list of projects backed by a single JSON array file.
///
/// Names are display labels, not keys: duplicates are accepted and
/// [`Registry::remove`] drops every record carrying the given name.
#[derive(Debug)]
pub struct Registry {
    file: PathBuf,
    projects: Vec<ProjectRecord>,
}

impl Registry {
    /// An empty registry that persists to `file`. Nothing is read until [`Registry::load`].
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            projects: Vec::new(),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn projects(&self) -> &[ProjectRecord] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Replaces the in-memory list with the file contents.
    ///
    /// A missing file yields an empty registry. On a read or parse failure the
    /// registry is left empty and the error is returned for the caller to report.
    #[instrument(skip(self), fields(file = %self.file.display()))]
    pub fn load(&mut self) -> Result<(), AppError> {
        self.projects.clear();

        let raw = match fs::read_to_string(&self.file) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No projects file yet, starting empty");
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, "Failed to read projects file");
                return Err(AppError::PersistenceRead(format!(
                    "{}: {}",
                    self.file.display(),
                    e
                )));
            }
        };

        let projects: Vec<ProjectRecord> = serde_json::from_str(&raw).map_err(|e| {
            warn!(error = %e, "Failed to parse projects file");
            AppError::PersistenceRead(format!("{}: {}", self.file.display(), e))
        })?;

        info!(count = projects.len(), "Loaded projects");
        self.projects = projects;
        Ok(())
    }

    /// Appends a record and saves. All three fields must be non-empty.
    ///
    /// The record stays in memory even if the save fails.
    #[instrument(skip(self, record), fields(name = %record.name))]
    pub fn add(&mut self, record: ProjectRecord) -> Result<(), AppError> {
        let missing = record.missing_fields();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Rejected project with empty fields");
            return Err(AppError::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }

        self.projects.push(record);
        debug!(count = self.projects.len(), "Project added");
        self.save()
    }

    /// Removes every record named `selected` and saves, returning how many were removed.
    ///
    /// `None` means nothing is selected. A name with no matches changes nothing.
    #[instrument(skip(self))]
    pub fn remove(&mut self, selected: Option<&str>) -> Result<usize, AppError> {
        let name = selected.ok_or(AppError::NoSelection)?;

        let before = self.projects.len();
        self.projects.retain(|p| p.name != name);
        let removed = before - self.projects.len();

        if removed == 0 {
            debug!("No project matched, nothing to remove");
            return Ok(0);
        }

        debug!(removed, "Projects removed");
        self.save()?;
        Ok(removed)
    }

    /// Overwrites the file with the full list, creating its directory if needed.
    #[instrument(skip(self), fields(file = %self.file.display(), count = self.projects.len()))]
    pub fn save(&self) -> Result<(), AppError> {
        if let Some(parent) = self.file.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| write_error(&self.file, e))?;
            }
        }

        let json = serde_json::to_string(&self.projects).map_err(|e| write_error(&self.file, e))?;
        fs::write(&self.file, json).map_err(|e| {
            warn!(error = %e, "Failed to write projects file");
            write_error(&self.file, e)
        })?;
        debug!("Projects saved");
        Ok(())
    }
}

fn write_error(file: &Path, e: impl std::fmt::Display) -> AppError {
    AppError::PersistenceWrite(format!("{}: {}", file.display(), e))
}
