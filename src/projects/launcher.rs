use crate::error::AppError;
use crate::projects::registry::Registry;
use crate::projects::terminal::ShellOpener;
use crate::utils::launch_log::LaunchLog;
use crate::utils::path_utils::resolve_existing_path;
use tracing::{info, instrument, warn};

#[derive(Debug)]
pub struct LaunchOutcome {
    pub name: String,
    /// Pid of the detached terminal host on success.
    pub result: Result<u32, AppError>,
}

/// Per-record results of a batch launch, in registry order.
#[derive(Debug, Default)]
pub struct LaunchReport {
    pub outcomes: Vec<LaunchOutcome>,
}

impl LaunchReport {
    pub fn launched(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    #[cfg(test)]
    pub fn failures(&self) -> impl Iterator<Item = (&str, &AppError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.launched()
    }

    /// `Ok` when every project launched, otherwise a summary error.
    pub fn into_result(self) -> Result<(), AppError> {
        match self.failed() {
            0 => Ok(()),
            failed => Err(AppError::LaunchIncomplete {
                failed,
                total: self.outcomes.len(),
            }),
        }
    }
}

pub struct Launcher<O: ShellOpener> {
    opener: O,
    log: Option<LaunchLog>,
}

impl<O: ShellOpener> Launcher<O> {
    pub fn new(opener: O) -> Self {
        Self { opener, log: None }
    }

    pub fn with_log(mut self, log: LaunchLog) -> Self {
        self.log = Some(log);
        self
    }

    #[cfg(test)]
    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Opens one terminal per project, in order. A failing project is reported
    /// and skipped; it never stops the rest of the batch.
    #[instrument(skip(self, registry), fields(count = registry.len()))]
    pub fn run_all(&self, registry: &Registry) -> LaunchReport {
        let mut report = LaunchReport::default();

        for project in registry.projects() {
            let result = match resolve_existing_path(&project.path) {
                None => Err(AppError::PathNotFound {
                    name: project.name.clone(),
                    path: project.path.clone(),
                }),
                Some(dir) => self
                    .opener
                    .open_interactive_shell(&dir, &project.command)
                    .map_err(|e| AppError::SpawnFailure {
                        name: project.name.clone(),
                        reason: e.to_string(),
                    }),
            };

            match &result {
                Ok(pid) => {
                    info!(project = %project.name, pid, "Terminal launched");
                    self.record(&project.name, &format!("launched pid={}", pid));
                }
                Err(e) => {
                    warn!(project = %project.name, error = %e, "Project failed to launch");
                    self.record(&project.name, &format!("failed: {}", e));
                }
            }

            report.outcomes.push(LaunchOutcome {
                name: project.name.clone(),
                result,
            });
        }

        info!(launched = report.launched(), failed = report.failed(), "Batch launch finished");
        report
    }

    fn record(&self, name: &str, outcome: &str) {
        if let Some(log) = &self.log {
            log.record(name, outcome);
        }
    }
}
