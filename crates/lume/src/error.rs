//! CLI error types.

use lume_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("{0}")]
    Validation(String),
}
