//! CLI error type.

use thiserror::Error;

pub type Result<T, E = CliError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] bindle_config::ConfigError),

    #[error("Build error: {0}")]
    Build(#[from] bindle_bundler::BuildError),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("No build targets could be resolved")]
    NothingToBuild,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
