//! bindle CLI: argument parsing, logging, the watch supervisor, and the
//! multi-config build fan-out.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod shortcuts;
pub mod ui;
pub mod watch;

pub use error::{CliError, Result};
