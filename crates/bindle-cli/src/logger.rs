//! Logging setup on the tracing ecosystem.
//!
//! Verbosity resolves in this order: `--verbose` forces debug for the
//! bindle crates, `--quiet` shows errors only, `RUST_LOG` overrides, and
//! the default is info for the bindle crates.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global subscriber. Call once, before any logging.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new("bindle=debug,bindle_config=debug,bindle_bundler=debug,bindle_cli=debug")
    } else if quiet {
        EnvFilter::new("bindle=error,bindle_config=error,bindle_bundler=error,bindle_cli=error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("bindle=info,bindle_config=info,bindle_bundler=info,bindle_cli=info")
        })
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
