use crate::config::Config;
use crate::utils::path_utils::shell_single_quote;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, error, info, instrument};

#[cfg(windows)]
const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;

/// Emulators probed on Unix desktops when none is configured, in order of preference.
const UNIX_TERMINALS: &[&str] = &["gnome-terminal", "konsole", "xterm"];

/// Opens an interactive shell in its own window, runs `command` from `path` and leaves it open.
pub trait ShellOpener {
    /// Returns the pid of the spawned terminal host.
    fn open_interactive_shell(&self, path: &Path, command: &str) -> io::Result<u32>;
}

/// A fully described process launch: program, argument vector and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Windows only: give the child its own console window.
    pub new_console: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalKind {
    WindowsConsole,
    MacTerminal,
    GnomeTerminal,
    Konsole,
    /// Any emulator that accepts `-e <program> <args...>` (xterm and friends).
    Generic(String),
}

impl TerminalKind {
    /// Picks the strategy for this machine once, at startup.
    pub fn detect(config: &Config) -> Self {
        if cfg!(windows) {
            return TerminalKind::WindowsConsole;
        }
        if cfg!(target_os = "macos") && config.terminal.is_none() {
            return TerminalKind::MacTerminal;
        }
        if let Some(program) = &config.terminal {
            return TerminalKind::from_program(program);
        }
        let found = UNIX_TERMINALS
            .iter()
            .find(|candidate| which::which(candidate).is_ok())
            .copied();
        match found {
            Some(program) => TerminalKind::from_program(program),
            None => {
                debug!("No known terminal emulator on PATH, defaulting to gnome-terminal");
                TerminalKind::GnomeTerminal
            }
        }
    }

    pub fn from_program(program: &str) -> Self {
        let base = Path::new(program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match base.as_str() {
            "gnome-terminal" => TerminalKind::GnomeTerminal,
            "konsole" => TerminalKind::Konsole,
            _ => TerminalKind::Generic(program.to_string()),
        }
    }

    /// Builds the launch for `command` run from `path`. The command text is handed
    /// to the shell untouched, so pipes and `&&` keep working.
    pub fn invocation(&self, path: &Path, command: &str, shell: &str) -> Invocation {
        let keep_open = format!("{}; exec {}", command, shell);
        let dir = path.to_string_lossy().into_owned();
        let (program, args, new_console) = match self {
            // With /s cmd strips exactly the outer pair of quotes, leaving the command intact
            TerminalKind::WindowsConsole => (
                "cmd".to_string(),
                vec![
                    "/s".to_string(),
                    "/k".to_string(),
                    format!("\"{}\"", command),
                ],
                true,
            ),
            TerminalKind::MacTerminal => {
                let line = format!("cd {} && {}", shell_single_quote(path), command);
                let script = format!(
                    "tell application \"Terminal\" to do script \"{}\"",
                    applescript_escape(&line)
                );
                ("osascript".to_string(), vec!["-e".to_string(), script], false)
            }
            TerminalKind::GnomeTerminal => (
                "gnome-terminal".to_string(),
                vec![
                    format!("--working-directory={}", dir),
                    "--".to_string(),
                    shell.to_string(),
                    "-c".to_string(),
                    keep_open,
                ],
                false,
            ),
            TerminalKind::Konsole => (
                "konsole".to_string(),
                vec![
                    "--workdir".to_string(),
                    dir,
                    "-e".to_string(),
                    shell.to_string(),
                    "-c".to_string(),
                    keep_open,
                ],
                false,
            ),
            TerminalKind::Generic(program) => (
                program.clone(),
                vec![
                    "-e".to_string(),
                    shell.to_string(),
                    "-c".to_string(),
                    keep_open,
                ],
                false,
            ),
        };
        Invocation {
            program,
            args,
            cwd: path.to_path_buf(),
            new_console,
        }
    }
}

fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// The real terminal host for this machine.
#[derive(Debug, Clone)]
pub struct PlatformTerminal {
    kind: TerminalKind,
    shell: String,
}

impl PlatformTerminal {
    pub fn new(kind: TerminalKind, shell: impl Into<String>) -> Self {
        Self {
            kind,
            shell: shell.into(),
        }
    }

    pub fn detect(config: &Config) -> Self {
        let kind = TerminalKind::detect(config);
        info!(terminal = ?kind, shell = %config.shell, "Selected terminal");
        Self::new(kind, config.shell.clone())
    }
}

impl ShellOpener for PlatformTerminal {
    #[instrument(skip(self, command), fields(terminal = ?self.kind))]
    fn open_interactive_shell(&self, path: &Path, command: &str) -> io::Result<u32> {
        let invocation = self.kind.invocation(path, command, &self.shell);
        spawn_detached(&invocation)
    }
}

/// Starts the invocation and forgets it: no piped I/O, no wait, no handle kept.
pub fn spawn_detached(invocation: &Invocation) -> io::Result<u32> {
    let mut cmd = Command::new(&invocation.program);
    cmd.current_dir(&invocation.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        // Raw so cmd.exe sees the command text exactly as stored
        for arg in &invocation.args {
            cmd.raw_arg(arg);
        }
        if invocation.new_console {
            cmd.creation_flags(CREATE_NEW_CONSOLE);
        }
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.args(&invocation.args);
        // Own process group so the terminal outlives us and ignores our Ctrl-C
        cmd.process_group(0);
    }

    #[cfg(not(any(unix, windows)))]
    cmd.args(&invocation.args);

    debug!(program = %invocation.program, args = ?invocation.args, cwd = %invocation.cwd.display(), "Spawning terminal");
    let child = cmd.spawn().map_err(|e| {
        error!(error = %e, program = %invocation.program, "Failed to spawn terminal");
        io::Error::new(e.kind(), format!("{}: {}", invocation.program, e))
    })?;
    Ok(child.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gnome_terminal_keeps_shell_open_in_project_dir() {
        let inv = TerminalKind::GnomeTerminal.invocation(
            Path::new("/srv/api"),
            "npm i && npm start",
            "bash",
        );
        assert_eq!(inv.program, "gnome-terminal");
        assert_eq!(
            inv.args,
            [
                "--working-directory=/srv/api",
                "--",
                "bash",
                "-c",
                "npm i && npm start; exec bash"
            ]
        );
        assert_eq!(inv.cwd, PathBuf::from("/srv/api"));
        assert!(!inv.new_console);
    }

    #[test]
    fn konsole_uses_workdir_flag() {
        let inv = TerminalKind::Konsole.invocation(Path::new("/srv/web"), "make", "zsh");
        assert_eq!(
            inv.args,
            ["--workdir", "/srv/web", "-e", "zsh", "-c", "make; exec zsh"]
        );
    }

    #[test]
    fn generic_emulator_relies_on_working_directory() {
        let inv = TerminalKind::Generic("xterm".into()).invocation(
            Path::new("/srv/db"),
            "docker compose up",
            "bash",
        );
        assert_eq!(inv.program, "xterm");
        assert_eq!(inv.args, ["-e", "bash", "-c", "docker compose up; exec bash"]);
        assert_eq!(inv.cwd, PathBuf::from("/srv/db"));
    }

    #[test]
    fn windows_console_passes_command_verbatim() {
        let inv = TerminalKind::WindowsConsole.invocation(
            Path::new(r"C:\work\api"),
            r#"echo "hi" && dir"#,
            "bash",
        );
        assert_eq!(inv.program, "cmd");
        assert_eq!(inv.args, ["/s", "/k", r#""echo "hi" && dir""#]);
        assert!(inv.new_console);
    }

    #[test]
    fn windows_console_wraps_command_starting_with_quoted_program() {
        let command = r#""C:\my app\run.exe" --out "x y""#;
        let inv = TerminalKind::WindowsConsole.invocation(Path::new(r"C:\work"), command, "bash");
        let tail = &inv.args[2];
        assert_eq!(tail, &format!("\"{}\"", command));
        // cmd /s drops the first and last quote; what remains is the stored text
        assert_eq!(&tail[1..tail.len() - 1], command);
    }

    #[test]
    fn mac_terminal_escapes_applescript_string() {
        let inv = TerminalKind::MacTerminal.invocation(
            Path::new("/Users/me/it's"),
            r#"echo "done""#,
            "bash",
        );
        assert_eq!(inv.program, "osascript");
        assert_eq!(inv.args[0], "-e");
        assert_eq!(
            inv.args[1],
            r#"tell application "Terminal" to do script "cd '/Users/me/it'\\''s' && echo \"done\"""#
        );
    }

    #[test]
    fn program_names_map_to_known_kinds() {
        assert_eq!(TerminalKind::from_program("gnome-terminal"), TerminalKind::GnomeTerminal);
        assert_eq!(TerminalKind::from_program("/usr/bin/konsole"), TerminalKind::Konsole);
        assert_eq!(
            TerminalKind::from_program("alacritty"),
            TerminalKind::Generic("alacritty".into())
        );
    }

    #[cfg(unix)]
    #[test]
    fn configured_terminal_wins_over_probing() {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.terminal = Some("konsole".into());
        assert_eq!(TerminalKind::detect(&config), TerminalKind::Konsole);
    }

    #[cfg(unix)]
    #[test]
    fn spawns_without_waiting_for_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation {
            program: "sleep".into(),
            args: vec!["5".into()],
            cwd: dir.path().to_path_buf(),
            new_console: false,
        };

        let started = std::time::Instant::now();
        let pid = spawn_detached(&inv).unwrap();

        assert!(pid > 0);
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation {
            program: "projects-runner-no-such-terminal".into(),
            args: vec![],
            cwd: dir.path().to_path_buf(),
            new_console: false,
        };
        let err = spawn_detached(&inv).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().starts_with("projects-runner-no-such-terminal: "));
    }
}
