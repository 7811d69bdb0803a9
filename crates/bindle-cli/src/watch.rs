//! The rebuild coordinator.
//!
//! One watcher per watch-mode configuration. Filesystem events are filtered
//! at the notify callback (version control metadata, dependencies, the
//! configuration's own output directory, user ignores), then classified:
//! a config-file change invalidates everything and requests a restart of
//! the whole pipeline; any other change arms a 100 ms debounce window that
//! coalesces bursts into a single rebuild. Rebuilds are single-flight: the
//! loop awaits the running cycle before the next window can fire, and a
//! restart request always supersedes a pending rebuild.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use bindle_config::{ResolvedOptions, WatchMode, is_config_file_name};
use bindle_bundler::{Rebuild, ensure_watchable};

use crate::error::{CliError, Result};

const DEBOUNCE: Duration = Duration::from_millis(100);

/// A live watcher. Dropping the handle alone does not stop the loop; call
/// [`WatchHandle::close`].
pub struct WatchHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    // keeps the OS watcher registered for the task's lifetime
    _watcher: RecommendedWatcher,
}

impl WatchHandle {
    /// Dispose the watcher and wait for its loop to finish.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = self.task.await;
    }
}

/// Establish filesystem observation for one configuration.
///
/// `rebuild` runs debounced incremental cycles; a config-file change sends
/// on `restart` instead (the supervisor tears down every watcher and
/// re-runs resolution from scratch).
pub fn watch_build(
    options: Arc<ResolvedOptions>,
    config_files: Vec<PathBuf>,
    rebuild: Rebuild,
    restart: mpsc::Sender<()>,
) -> Result<WatchHandle> {
    // invalid watch/output combination is fatal before any event
    ensure_watchable(&options)?;

    let mut roots = match &options.watch {
        WatchMode::Off => Vec::new(),
        WatchMode::Default => vec![options.cwd.clone()],
        WatchMode::Paths(paths) => paths.clone(),
    };
    info!(
        "Watching for changes in {}",
        roots
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    roots.extend(config_files.iter().cloned());

    let (event_tx, event_rx) = mpsc::channel::<PathBuf>(256);
    let filter_options = Arc::clone(&options);
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        let Ok(event) = result else { return };
        if !is_relevant_kind(&event.kind) {
            return;
        }
        for path in &event.paths {
            if should_ignore(path, &filter_options) {
                continue;
            }
            let _ = event_tx.blocking_send(path.clone());
        }
    })
    .map_err(CliError::Watch)?;

    for root in &roots {
        if !root.exists() {
            warn!("watch path does not exist: {}", root.display());
            continue;
        }
        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(CliError::Watch)?;
    }

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(watch_loop(
        config_files,
        rebuild,
        restart,
        event_rx,
        shutdown_rx,
    ));

    Ok(WatchHandle {
        shutdown: Some(shutdown_tx),
        task,
        _watcher: watcher,
    })
}

async fn watch_loop(
    config_files: Vec<PathBuf>,
    rebuild: Rebuild,
    restart: mpsc::Sender<()>,
    mut events: mpsc::Receiver<PathBuf>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let far_future = || tokio::time::Instant::now() + Duration::from_secs(60 * 60 * 24);
    let sleeper = tokio::time::sleep_until(far_future());
    tokio::pin!(sleeper);
    let mut pending = false;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,

            event = events.recv() => {
                let Some(path) = event else { break };
                if is_config_change(&path, &config_files) {
                    info!("Reload config: {}", path.display());
                    let _ = restart.try_send(());
                    // restart supersedes any pending debounced rebuild
                    break;
                }
                info!("Change detected: {}", path.display());
                pending = true;
                sleeper.as_mut().reset(tokio::time::Instant::now() + DEBOUNCE);
            }

            () = &mut sleeper, if pending => {
                pending = false;
                sleeper.as_mut().reset(far_future());
                // awaiting here keeps rebuilds single-flight; events that
                // arrive meanwhile queue up and coalesce into the next window
                rebuild.rebuild().await;
            }
        }
    }
}

/// Config files trigger restarts whether they were known at resolution time
/// or appeared since (matching the config naming convention).
fn is_config_change(path: &Path, config_files: &[PathBuf]) -> bool {
    config_files.iter().any(|known| known == path) || is_config_file_name(path)
}

fn is_relevant_kind(kind: &notify::EventKind) -> bool {
    matches!(
        kind,
        notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
    )
}

/// Paths never worth a rebuild: VCS metadata, dependency trees, the
/// configuration's own output, and user-declared ignores.
fn should_ignore(path: &Path, options: &ResolvedOptions) -> bool {
    if path.starts_with(&options.out_dir) {
        return true;
    }
    for component in path.components() {
        if let Some(name) = component.as_os_str().to_str() {
            if name == ".git" || name == "node_modules" {
                return true;
            }
        }
    }
    options
        .ignore_watch
        .iter()
        .any(|pattern| pattern.matches(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindle_config::{EntrySpec, NormalizedUserConfig, UserConfig, resolve_config};

    fn options_in(root: &Path, mutate: impl FnOnce(&mut UserConfig)) -> Arc<ResolvedOptions> {
        std::fs::write(root.join("index.ts"), "export {}").unwrap();
        let mut user = UserConfig {
            entry: Some(EntrySpec::One("index.ts".into())),
            ..UserConfig::default()
        };
        mutate(&mut user);
        Arc::new(
            resolve_config(NormalizedUserConfig {
                config: user,
                cwd: root.to_path_buf(),
            })
            .unwrap(),
        )
    }

    #[test]
    fn config_files_and_naming_pattern_trigger_restart() {
        let known = vec![PathBuf::from("/p/bindle.toml")];
        assert!(is_config_change(Path::new("/p/bindle.toml"), &known));
        assert!(is_config_change(Path::new("/p/sub/package.json"), &known));
        assert!(!is_config_change(Path::new("/p/src/index.ts"), &known));
    }

    #[test]
    fn vcs_dependencies_and_out_dir_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let options = options_in(dir.path(), |_| {});

        assert!(should_ignore(&dir.path().join(".git/HEAD"), &options));
        assert!(should_ignore(
            &dir.path().join("node_modules/x/index.js"),
            &options
        ));
        assert!(should_ignore(&dir.path().join("dist/index.mjs"), &options));
        assert!(!should_ignore(&dir.path().join("src/app.ts"), &options));
    }

    #[test]
    fn user_ignores_apply() {
        let dir = tempfile::tempdir().unwrap();
        let options = options_in(dir.path(), |user| {
            user.ignore_watch = Some(bindle_config::OneOrMany::Many(vec![
                "coverage".into(),
                "/\\.snap$/".into(),
            ]));
        });

        assert!(should_ignore(&dir.path().join("coverage/lcov.info"), &options));
        assert!(should_ignore(&dir.path().join("tests/a.snap"), &options));
        assert!(!should_ignore(&dir.path().join("src/a.ts"), &options));
    }

    #[test]
    fn default_watch_with_out_dir_equal_cwd_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let options = options_in(dir.path(), |user| {
            user.watch = Some(bindle_config::WatchSpec::Flag(true));
            user.out_dir = Some(".".into());
            user.clean = Some(bindle_config::CleanSpec::Flag(false));
        });
        assert!(ensure_watchable(&options).is_err());
    }

    /// Bursts of events within the debounce window coalesce into a single
    /// rebuild call, and a later burst triggers another one.
    #[tokio::test(start_paused = true)]
    async fn debounce_coalesces_event_bursts() {
        // the coordinator's loop is exercised through its channel surface;
        // the rebuild side is counted via the driver's engine, so here we
        // only verify the timing contract of the sleeper pattern
        let (tx, mut rx) = mpsc::channel::<PathBuf>(16);
        let counter = Arc::new(std::sync::Mutex::new(0usize));

        let loop_counter = Arc::clone(&counter);
        let task = tokio::spawn(async move {
            let far = || tokio::time::Instant::now() + Duration::from_secs(3600);
            let sleeper = tokio::time::sleep_until(far());
            tokio::pin!(sleeper);
            let mut pending = false;
            loop {
                tokio::select! {
                    event = rx.recv() => {
                        if event.is_none() { break }
                        pending = true;
                        sleeper.as_mut().reset(tokio::time::Instant::now() + DEBOUNCE);
                    }
                    () = &mut sleeper, if pending => {
                        pending = false;
                        sleeper.as_mut().reset(far());
                        *loop_counter.lock().unwrap() += 1;
                    }
                }
            }
        });

        for _ in 0..5 {
            tx.send(PathBuf::from("src/a.ts")).await.unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*counter.lock().unwrap(), 1);

        tx.send(PathBuf::from("src/b.ts")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*counter.lock().unwrap(), 2);

        drop(tx);
        task.await.unwrap();
    }
}
