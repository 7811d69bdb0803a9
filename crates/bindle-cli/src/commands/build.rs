//! The build command: multi-config fan-out plus the watch supervisor.
//!
//! One pipeline run resolves every configuration, starts one build driver
//! per target concurrently (sharing a single memoized clean), and attaches
//! a rebuild coordinator to every watch-mode target. A restart request
//! (config-file change or the `r` shortcut) disposes all watchers and
//! re-runs the pipeline from scratch; restart is always global, never
//! partial.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info};

use bindle_bundler::{BuildDriver, CleanTrigger, Engine, ExitFlag, Rebuild, RolldownEngine};
use bindle_config::resolve_options;

use crate::cli::Cli;
use crate::error::{CliError, Result};
use crate::watch::watch_build;
use crate::{shortcuts, ui};

enum RunOutcome {
    /// One-shot build finished with this exit code.
    Completed(i32),
    /// A restart was requested; re-run the whole pipeline.
    Restart,
    /// Interrupted; exit with this code.
    Shutdown(i32),
}

/// Run the build pipeline, restarting on demand, until it completes or is
/// interrupted. Returns the process exit code.
pub async fn execute(args: &Cli) -> Result<i32> {
    loop {
        match run_pipeline(args).await? {
            RunOutcome::Completed(code) | RunOutcome::Shutdown(code) => return Ok(code),
            RunOutcome::Restart => {
                info!("Restarting build");
            }
        }
    }
}

async fn run_pipeline(args: &Cli) -> Result<RunOutcome> {
    let started = Instant::now();
    let overrides = args.overrides();
    let resolved = resolve_options(&overrides, args.config.as_deref(), args.no_config)?;
    let config_files = resolved.files;

    let exit = ExitFlag::new();
    let mut configs = Vec::new();
    for result in resolved.configs {
        match result {
            Ok(options) => configs.push(Arc::new(options)),
            // a failed sibling never aborts the others, but the process
            // must exit non-zero
            Err(err) => {
                error!("{err}");
                exit.set(1);
            }
        }
    }
    if configs.is_empty() {
        return Err(CliError::NothingToBuild);
    }

    let engine: Arc<dyn Engine> = Arc::new(RolldownEngine::new());
    let clean = Arc::new(CleanTrigger::new(configs.clone()));

    info!("Build start");
    let mut tasks = JoinSet::new();
    for options in &configs {
        let driver = Arc::new(BuildDriver::new(
            Arc::clone(options),
            Arc::clone(&engine),
            exit.clone(),
        ));
        let clean = Arc::clone(&clean);
        tasks.spawn(async move { driver.build(clean).await });
    }

    let mut rebuilds: Vec<Rebuild> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let result = joined
            .map_err(|err| bindle_bundler::BuildError::Engine(format!("build task failed: {err}")))?;
        match result {
            Ok(Some(rebuild)) => rebuilds.push(rebuild),
            Ok(None) => {}
            // a one-shot build failure aborts the whole multi-config run
            Err(err) => return Err(err.into()),
        }
    }

    if rebuilds.is_empty() {
        ui::success(&format!(
            "Build finished in {}",
            ui::format_duration(started.elapsed())
        ));
        return Ok(RunOutcome::Completed(exit.code()));
    }

    let (restart_tx, mut restart_rx) = mpsc::channel(1);
    let mut handles = Vec::new();
    for rebuild in rebuilds {
        handles.push(watch_build(
            Arc::clone(rebuild.options()),
            config_files.clone(),
            rebuild,
            restart_tx.clone(),
        )?);
    }
    drop(restart_tx);

    let mut shortcut_rx = shortcuts::listen();
    info!("Watching... press r + enter to restart, ctrl-c to stop");

    let outcome = tokio::select! {
        changed = restart_rx.recv() => match changed {
            Some(()) => RunOutcome::Restart,
            None => RunOutcome::Shutdown(exit.code()),
        },
        shortcut = shortcut_rx.recv() => match shortcut {
            Some(()) => RunOutcome::Restart,
            None => RunOutcome::Shutdown(exit.code()),
        },
        _ = tokio::signal::ctrl_c() => RunOutcome::Shutdown(exit.code()),
    };

    // restart (or shutdown) disposes every active watcher before anything
    // else happens
    for handle in handles {
        handle.close().await;
    }

    Ok(outcome)
}
