//! Packaging lint and type-compatibility checks.
//!
//! Both tools are external collaborators invoked as subprocesses after a
//! successful build. Findings never abort anything: an error-severity
//! outcome sets a sticky non-zero exit code and the already-written output
//! stays on disk. A tool that cannot be spawned at all is reported and
//! skipped (best-effort).

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use tokio::process::Command;
use tracing::{info, warn};

use bindle_config::ResolvedOptions;

use crate::error::Result;

/// Process-exit-code cell shared by everything that can demand a non-zero
/// exit without aborting the run. First failure wins.
#[derive(Debug, Clone, Default)]
pub struct ExitFlag(Arc<AtomicI32>);

impl ExitFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure exit code unless one is already set.
    pub fn set(&self, code: i32) {
        let _ = self
            .0
            .compare_exchange(0, code, Ordering::SeqCst, Ordering::SeqCst);
    }

    pub fn code(&self) -> i32 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run the packaging lint, if enabled.
pub async fn publint(options: &ResolvedOptions, exit: &ExitFlag) -> Result<()> {
    let Some(config) = &options.publint else {
        return Ok(());
    };
    if options.pkg.is_none() {
        warn!("publint is enabled but package.json is not found");
        return Ok(());
    }

    let started = std::time::Instant::now();
    let mut command = Command::new("publint");
    command.current_dir(&options.cwd);
    if let Some(level) = &config.level {
        command.arg("--level").arg(level);
    }
    run_check("publint", command, exit).await;
    tracing::debug!("publint finished in {}ms", started.elapsed().as_millis());
    Ok(())
}

/// Run the type-compatibility check, if enabled.
pub async fn attw(options: &ResolvedOptions, exit: &ExitFlag) -> Result<()> {
    let Some(config) = &options.attw else {
        return Ok(());
    };
    if options.pkg.is_none() {
        warn!("attw is enabled but package.json is not found");
        return Ok(());
    }

    let mut command = Command::new("attw");
    command.current_dir(&options.cwd).arg("--pack");
    if let Some(profile) = &config.profile {
        command.arg("--profile").arg(profile);
    }
    run_check("attw", command, exit).await;
    Ok(())
}

/// Spawn one checker with inherited output. A non-zero status marks the
/// process exit code; a spawn failure is logged and swallowed.
async fn run_check(name: &str, mut command: Command, exit: &ExitFlag) {
    command.stdin(Stdio::null());
    match command.status().await {
        Ok(status) if status.success() => {
            info!("no {name} issues found");
        }
        Ok(status) => {
            warn!("{name} reported errors");
            exit.set(status.code().unwrap_or(1));
        }
        Err(err) => {
            warn!("could not run {name}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_flag_keeps_first_failure() {
        let flag = ExitFlag::new();
        assert_eq!(flag.code(), 0);
        flag.set(2);
        flag.set(1);
        assert_eq!(flag.code(), 2);
    }

    #[test]
    fn exit_flag_is_shared_between_clones() {
        let flag = ExitFlag::new();
        let clone = flag.clone();
        clone.set(1);
        assert_eq!(flag.code(), 1);
    }
}
