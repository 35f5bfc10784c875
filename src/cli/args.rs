use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "projects-runner",
    version,
    about = "Register local projects and open each one in its own terminal"
)]
pub struct Cli {
    /// Projects file to use instead of PROJECTS_FILE
    #[arg(long, global = true, value_name = "PATH")]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum Command {
    /// List registered projects in order
    List,
    /// Register a project
    Add {
        name: String,
        /// Directory the command runs from
        path: String,
        /// Command line passed to the shell as written
        command: String,
    },
    /// Remove every project with the given name
    Remove {
        /// Name of the selected project
        name: Option<String>,
    },
    /// Open a terminal for every project
    Run,
    /// Print the effective configuration
    Config,
}
