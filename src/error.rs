use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Path not found for project '{name}': {path}")]
    PathNotFound { name: String, path: String },

    #[error("Failed to open terminal for project '{name}': {reason}")]
    SpawnFailure { name: String, reason: String },

    #[error("Failed to load projects: {0}")]
    PersistenceRead(String),

    #[error("Failed to save projects: {0}")]
    PersistenceWrite(String),

    #[error("No project selected")]
    NoSelection,

    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("{failed} of {total} projects failed to launch")]
    LaunchIncomplete { failed: usize, total: usize },

    #[error("I/O error: {0}")]
    StdIoError(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// Process exit code used when the error ends a CLI invocation.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Validation(_) | AppError::NoSelection => 2,
            AppError::PathNotFound { .. }
            | AppError::SpawnFailure { .. }
            | AppError::LaunchIncomplete { .. } => 3,
            AppError::PersistenceRead(_) | AppError::PersistenceWrite(_) => 4,
            AppError::Config(_) => 78, // EX_CONFIG
            AppError::StdIoError(_) => 74,
            AppError::SerdeJsonError(_) => 70,
        }
    }
}
