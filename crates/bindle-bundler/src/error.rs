//! Build-time error types.

use thiserror::Error;

pub type Result<T, E = BuildError> = std::result::Result<T, E>;

/// Errors raised while driving builds.
///
/// Configuration errors stay fatal and pre-build; engine errors are scoped
/// to one format of one rebuild cycle and, in watch mode, never tear the
/// watcher down.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] bindle_config::ConfigError),

    /// The bundler engine rejected or failed a build invocation
    #[error("bundler failed: {0}")]
    Engine(String),

    /// A lifecycle hook returned an error, aborting the cycle
    #[error("hook '{hook}' failed: {message}")]
    Hook {
        hook: &'static str,
        message: String,
    },

    /// An emitted filename tried to escape the output directory
    #[error("invalid output path: {0}")]
    InvalidOutputPath(String),

    /// Writing build output failed
    #[error("failed to write output: {0}")]
    Write(String),

    /// A spawned tool (lint, success command) could not be started
    #[error("failed to spawn '{command}': {message}")]
    Spawn { command: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
