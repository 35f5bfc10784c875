// FILE: src/main.rs
mod cli;
mod config;
mod error;
mod projects;
mod utils;

use crate::cli::args::Cli;
use crate::cli::handler::App;
use crate::config::{Config, LogFormat};
use clap::Parser;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, FmtSubscriber};

fn setup_logging(log_level_str: &str, format: LogFormat) {
    let level = match log_level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("projects_runner={}", level)));

    let builder = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_level(true);

    let result = match format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish())
        }
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish()),
    };
    if let Err(e) = result {
        eprintln!("warning: failed to set tracing subscriber: {}", e);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: failed to load configuration: {:#}", e);
            return ExitCode::from(78);
        }
    };
    if let Some(file) = cli.file {
        config = config.with_projects_file(file);
    }
    setup_logging(&config.log_level, config.log_format);

    tracing::info!(version = %env!("CARGO_PKG_VERSION"), "Starting projects-runner");
    tracing::debug!("Loaded configuration: {:?}", config);

    let mut app = App::from_config(config);
    tracing::debug!(file = %app.registry().file().display(), "Loading projects");
    if let Err(e) = app.load() {
        // Fail open: keep going with an empty list
        eprintln!("warning: {}", e);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match app.execute(cli.command, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
