//! Terminal status lines.

use std::time::Duration;

use owo_colors::OwoColorize;

/// Disable colors process-wide when requested or unsupported.
pub fn init_colors(no_color: bool) {
    if no_color || std::env::var("NO_COLOR").is_ok() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
}

fn colors_enabled() -> bool {
    console::colors_enabled_stderr()
}

pub fn success(message: &str) {
    if colors_enabled() {
        eprintln!("{} {message}", "✓".green());
    } else {
        eprintln!("✓ {message}");
    }
}

pub fn error(message: &str) {
    if colors_enabled() {
        eprintln!("{} {message}", "✗".red());
    } else {
        eprintln!("✗ {message}");
    }
}

pub fn info(message: &str) {
    if colors_enabled() {
        eprintln!("{} {message}", "•".blue());
    } else {
        eprintln!("• {message}");
    }
}

/// Compact human-readable duration.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}
