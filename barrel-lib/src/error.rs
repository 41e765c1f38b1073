//! Error types for barrel

use thiserror::Error;

/// Barrel result type
pub type Result<T> = std::result::Result<T, BarrelError>;

/// Main error type for barrel operations
#[derive(Error, Debug)]
pub enum BarrelError {
    /// Bad user input, raised before anything touches the filesystem
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// External runner failed to spawn or exited unsuccessfully
    #[error("Runner failed: {command} - {error}")]
    Runner { command: String, error: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

impl BarrelError {
    pub(crate) fn runner(command: impl Into<String>, error: impl ToString) -> Self {
        BarrelError::Runner {
            command: command.into(),
            error: error.to_string(),
        }
    }
}
