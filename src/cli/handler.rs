use crate::cli::args::Command;
use crate::config::Config;
use crate::error::AppError;
use crate::projects::launcher::Launcher;
use crate::projects::registry::{ProjectRecord, Registry};
use crate::projects::terminal::{PlatformTerminal, ShellOpener};
use crate::utils::launch_log::LaunchLog;
use std::io::Write;
use tracing::{info, instrument};

/// Top-level controller: owns the registry and the launcher for one session.
pub struct App<O: ShellOpener> {
    config: Config,
    registry: Registry,
    launcher: Launcher<O>,
}

impl App<PlatformTerminal> {
    pub fn from_config(config: Config) -> Self {
        let terminal = PlatformTerminal::detect(&config);
        Self::new(config, terminal)
    }
}

impl<O: ShellOpener> App<O> {
    /// Starts with an empty registry; call [`App::load`] to read the projects file.
    pub fn new(config: Config, opener: O) -> Self {
        let registry = Registry::new(config.projects_file.clone());
        let launcher = Launcher::new(opener).with_log(LaunchLog::new(&config));
        Self {
            config,
            registry,
            launcher,
        }
    }

    /// Reads the projects file. On failure the session keeps going with an empty registry.
    pub fn load(&mut self) -> Result<(), AppError> {
        self.registry.load()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[instrument(skip(self, out))]
    pub fn execute(&mut self, command: Command, out: &mut impl Write) -> Result<(), AppError> {
        match command {
            Command::List => {
                if self.registry.is_empty() {
                    writeln!(out, "No projects registered.")?;
                }
                for project in self.registry.projects() {
                    writeln!(out, "{}\t{}\t{}", project.name, project.path, project.command)?;
                }
                Ok(())
            }
            Command::Add {
                name,
                path,
                command,
            } => {
                self.registry
                    .add(ProjectRecord::new(name.clone(), path, command))?;
                writeln!(out, "Added project '{}'.", name)?;
                Ok(())
            }
            Command::Remove { name } => {
                let removed = self.registry.remove(name.as_deref())?;
                let name = name.unwrap_or_default();
                match removed {
                    0 => writeln!(out, "No project named '{}'.", name)?,
                    1 => writeln!(out, "Removed project '{}'.", name)?,
                    n => writeln!(out, "Removed {} projects named '{}'.", n, name)?,
                }
                Ok(())
            }
            Command::Run => {
                let report = self.launcher.run_all(&self.registry);
                for outcome in &report.outcomes {
                    match &outcome.result {
                        Ok(pid) => writeln!(out, "started  {} (pid {})", outcome.name, pid)?,
                        Err(e) => writeln!(out, "failed   {}: {}", outcome.name, e)?,
                    }
                }
                info!(launched = report.launched(), "Run finished");
                report.into_result()
            }
            Command::Config => {
                writeln!(out, "{}", serde_json::to_string_pretty(&self.config)?)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;
    use std::path::Path;

    #[derive(Default)]
    struct CountingOpener {
        opened: Cell<u32>,
    }

    impl ShellOpener for CountingOpener {
        fn open_interactive_shell(&self, _path: &Path, _command: &str) -> io::Result<u32> {
            self.opened.set(self.opened.get() + 1);
            Ok(self.opened.get())
        }
    }

    fn app_in(dir: &tempfile::TempDir) -> App<CountingOpener> {
        let config = Config::from_lookup(|_| None)
            .unwrap()
            .with_projects_file(dir.path().join("data").join("projects.json"));
        App::new(config, CountingOpener::default())
    }

    fn run(app: &mut App<CountingOpener>, command: Command) -> (Result<(), AppError>, String) {
        let mut out = Vec::new();
        let result = app.execute(command, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    fn add(name: &str, path: &str, command: &str) -> Command {
        Command::Add {
            name: name.into(),
            path: path.into(),
            command: command.into(),
        }
    }

    #[test]
    fn add_list_and_remove_through_commands() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);

        let (result, out) = run(&mut app, add("api", "/srv/api", "cargo run"));
        result.unwrap();
        assert_eq!(out, "Added project 'api'.\n");

        let (_, out) = run(&mut app, Command::List);
        assert_eq!(out, "api\t/srv/api\tcargo run\n");

        let (result, out) = run(&mut app, Command::Remove { name: Some("api".into()) });
        result.unwrap();
        assert_eq!(out, "Removed project 'api'.\n");

        let (_, out) = run(&mut app, Command::List);
        assert_eq!(out, "No projects registered.\n");
    }

    #[test]
    fn remove_without_name_is_no_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        let (result, _) = run(&mut app, Command::Remove { name: None });
        assert!(matches!(result, Err(AppError::NoSelection)));
    }

    #[test]
    fn state_survives_a_new_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = app_in(&dir);
        run(&mut first, add("a", "/1", "ls")).0.unwrap();
        run(&mut first, add("b", "/2", "ls")).0.unwrap();

        let mut second = app_in(&dir);
        second.load().unwrap();
        assert_eq!(second.registry().len(), 2);
    }

    #[test]
    fn corrupt_file_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data").join("projects.json"), "nope").unwrap();

        assert!(matches!(app.load(), Err(AppError::PersistenceRead(_))));
        run(&mut app, add("a", "/1", "ls")).0.unwrap();
        assert_eq!(app.registry().len(), 1);
    }

    #[test]
    fn run_reports_each_project_and_summarises_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        let here = dir.path().to_str().unwrap().to_string();
        run(&mut app, add("ok", &here, "ls")).0.unwrap();
        run(&mut app, add("gone", "/does/not/exist", "ls")).0.unwrap();

        let (result, out) = run(&mut app, Command::Run);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "started  ok (pid 1)");
        assert!(lines[1].starts_with("failed   gone: Path not found"));
        assert!(matches!(
            result,
            Err(AppError::LaunchIncomplete { failed: 1, total: 2 })
        ));
        assert!(dir.path().join("data").join("launches.log").exists());
    }

    #[test]
    fn read_only_commands_leave_disk_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.load().unwrap();
        run(&mut app, Command::List).0.unwrap();
        run(&mut app, Command::Config).0.unwrap();
        assert!(!dir.path().join("data").exists());
    }

    #[test]
    fn config_prints_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        let (result, out) = run(&mut app, Command::Config);
        result.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["shell"], "bash");
        assert_eq!(value["log_format"], "pretty");
    }
}
