//! Error types for configuration normalization and resolution.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Configuration-specific errors.
///
/// These occur before any build starts. Each failure aborts resolution for
/// the one configuration it was raised for; sibling configurations in a
/// workspace keep resolving independently.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A clean pattern resolves to the working directory itself
    #[error("cannot clean the current working directory: {}\n\nHint: point 'clean' at a subdirectory such as the output directory", .0.display())]
    CleanCwd(PathBuf),

    /// Mutually exclusive options were specified together
    #[error("conflicting options: '{current}' cannot be combined with deprecated '{deprecated}'\n\nHint: remove '{deprecated}' and keep '{current}'")]
    ConflictingOptions {
        current: &'static str,
        deprecated: &'static str,
    },

    /// An imported external config carries a field shape this resolver does not read
    #[error("unsupported '{field}' shape in {}: expected {expected}", .path.display())]
    UnsupportedShape {
        path: PathBuf,
        field: &'static str,
        expected: &'static str,
    },

    /// Workspace discovery produced no member packages
    #[error("no workspace packages found below {}\n\nHint: check the 'workspace' include patterns", .0.display())]
    NoWorkspacePackages(PathBuf),

    /// A package filter removed every workspace member
    #[error("no packages matched the filter '{0}'")]
    NoPackagesMatched(String),

    /// An entry point does not exist on disk
    #[error("entry point not found: {}", .0.display())]
    EntryNotFound(PathBuf),

    /// No entry points were configured or matched
    #[error("no entry points specified{}\n\nHint: set 'entry' in the config or pass entry files on the command line", .0.as_deref().map(|n| format!(" for {n}")).unwrap_or_default())]
    NoEntry(Option<String>),

    /// An output format alias is not recognized
    #[error("unknown output format '{0}'\n\nHint: expected one of es, cjs, iife, umd")]
    UnknownFormat(String),

    /// Invalid value for a configuration field
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    /// Config file exists but cannot be parsed
    #[error("failed to parse config file {}: {message}", .path.display())]
    ParseFailed { path: PathBuf, message: String },

    /// A `/pattern/` string is not a valid regular expression
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Glob pattern compilation failed
    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
