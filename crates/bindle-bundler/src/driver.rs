//! The build driver: one resolved configuration, one lifecycle.
//!
//! Each rebuild cycle runs the same strictly ordered stages:
//!
//! 1. `build:prepare` hook, then cancel the previous cycle's still-running
//!    success action;
//! 2. clean: the shared deduplicated step on the first cycle, this
//!    configuration's own globs on rebuilds;
//! 3. build every format concurrently, with a second declaration-only pass
//!    for CommonJS when declarations are enabled;
//! 4. post-process: export map and copy concurrently, then lint and
//!    compatibility checks concurrently;
//! 5. `build:done` hook, success log, arm a fresh cancellation token, run
//!    the success action.
//!
//! Cycles of one driver never overlap; sibling drivers are fully
//! independent apart from the shared first clean.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use bindle_config::{Format, ResolvedOptions, WatchMode, has_modern_node_target};

use crate::clean::{CleanTrigger, clean_targets};
use crate::copy::copy_assets;
use crate::engine::{Engine, OutputFile};
use crate::error::{BuildError, Result};
use crate::exports::write_exports;
use crate::hooks::{HookContext, Hooks};
use crate::lint::{ExitFlag, attw, publint};
use crate::options::build_request;
use crate::output::write_files;
use crate::report::report_chunks;
use crate::success::run_success_action;

/// Emitted artifacts of one rebuild cycle, keyed by format. The CommonJS
/// declaration pass appends to the same format's list.
pub type BuildChunks = BTreeMap<Format, Vec<OutputFile>>;

/// Drives the build lifecycle for exactly one resolved configuration.
pub struct BuildDriver {
    options: Arc<ResolvedOptions>,
    engine: Arc<dyn Engine>,
    hooks: Hooks,
    context: Mutex<HookContext>,
    exit: ExitFlag,
    armed: std::sync::Mutex<Option<CancellationToken>>,
    /// Held across a whole cycle: cycles of one configuration never overlap.
    cycle_lock: Mutex<()>,
}

impl BuildDriver {
    pub fn new(options: Arc<ResolvedOptions>, engine: Arc<dyn Engine>, exit: ExitFlag) -> Self {
        let context = Mutex::new(HookContext::new(Arc::clone(&options)));
        Self {
            options,
            engine,
            hooks: Hooks::new(),
            context,
            exit,
            armed: std::sync::Mutex::new(None),
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn options(&self) -> &Arc<ResolvedOptions> {
        &self.options
    }

    /// Run the first cycle. Returns a rebuild handle when watch mode is
    /// enabled, so the watch loop can trigger further cycles.
    pub async fn build(self: Arc<Self>, clean: Arc<CleanTrigger>) -> Result<Option<Rebuild>> {
        // invariant violations are raised once, before the first cycle
        ensure_watchable(&self.options)?;
        warn_legacy_cjs(&self.options);
        self.run_cycle(Some(&clean)).await?;
        if self.options.watch.is_enabled() {
            Ok(Some(Rebuild { driver: self }))
        } else {
            Ok(None)
        }
    }

    async fn run_cycle(self: &Arc<Self>, first: Option<&CleanTrigger>) -> Result<()> {
        let _cycle = self.cycle_lock.lock().await;
        let started = Instant::now();
        let watch = self.options.watch.is_enabled();

        // prepare: hook first, then cancel the previous success action so
        // it receives its termination request before new work begins
        self.hooks
            .call_prepare(&mut *self.context.lock().await)
            .await?;
        if let Some(token) = self.armed.lock().expect("armed token lock").take() {
            token.cancel();
        }

        match first {
            Some(trigger) => trigger.run().await?,
            None => clean_targets(std::slice::from_ref(&self.options)).await?,
        }

        let multi_format = self.options.format.len() > 1;
        let mut tasks = JoinSet::new();
        for format in self.options.format.clone() {
            let driver = Arc::clone(self);
            tasks.spawn(async move {
                let files = driver.build_format(format, multi_format).await;
                (format, files)
            });
        }

        let mut chunks = BuildChunks::new();
        let mut has_errors = false;
        while let Some(joined) = tasks.join_next().await {
            let (format, result) =
                joined.map_err(|err| BuildError::Engine(format!("build task failed: {err}")))?;
            match result {
                Ok(files) => {
                    chunks.insert(format, files);
                }
                Err(err) if watch => {
                    // isolate the failing format; siblings in this cycle
                    // still complete, the cycle is marked failed
                    error!("{err}");
                    has_errors = true;
                }
                Err(err) => return Err(err),
            }
        }

        if has_errors {
            return Ok(());
        }

        report_chunks(&self.options, &chunks);

        let (exports_result, copy_result) = tokio::join!(
            write_exports(&self.options, &chunks),
            copy_assets(&self.options),
        );
        exports_result?;
        copy_result?;

        let (publint_result, attw_result) = tokio::join!(
            publint(&self.options, &self.exit),
            attw(&self.options, &self.exit),
        );
        publint_result?;
        attw_result?;

        self.hooks
            .call_done(&mut *self.context.lock().await)
            .await?;

        let prefix = self
            .options
            .name
            .as_deref()
            .map(|name| format!("[{name}] "))
            .unwrap_or_default();
        info!(
            "{prefix}{} complete in {}ms",
            if first.is_some() { "Build" } else { "Rebuild" },
            started.elapsed().as_millis()
        );

        let token = CancellationToken::new();
        *self.armed.lock().expect("armed token lock") = Some(token.clone());
        if let Some(action) = &self.options.on_success {
            run_success_action(
                action,
                Arc::clone(&self.options),
                token,
                self.exit.clone(),
            )
            .await?;
        }

        Ok(())
    }

    /// Build one format: construct the request, fire `build:before`, invoke
    /// the engine, write the output, and run the declaration-only CommonJS
    /// pass when needed.
    async fn build_format(&self, format: Format, multi_format: bool) -> Result<Vec<OutputFile>> {
        let request = build_request(&self.options, format, multi_format, false);
        self.hooks
            .call_before(&mut *self.context.lock().await, &request)
            .await?;

        let output = self.engine.build(request).await?;
        write_files(&output.files, &self.options.out_dir)?;
        let mut files = output.files;

        // the cjs code pass cannot emit its declaration wrapper (that
        // demands esm-style emission), so declarations get their own pass
        if format == Format::Cjs && self.options.dts.is_some() {
            let request = build_request(&self.options, format, multi_format, true);
            let output = self.engine.build(request).await?;
            write_files(&output.files, &self.options.out_dir)?;
            files.extend(output.files);
        }

        Ok(files)
    }
}

impl std::fmt::Debug for BuildDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildDriver")
            .field("options", &self.options.name)
            .finish_non_exhaustive()
    }
}

/// Handle for triggering further cycles of a watch-mode driver. Cycles run
/// strictly sequentially; errors are logged, never propagated, so the
/// watcher stays alive.
#[derive(Clone)]
pub struct Rebuild {
    driver: Arc<BuildDriver>,
}

impl Rebuild {
    pub async fn rebuild(&self) {
        if let Err(err) = self.driver.run_cycle(None).await {
            error!("{err}");
        }
    }

    pub fn options(&self) -> &Arc<ResolvedOptions> {
        self.driver.options()
    }
}

impl std::fmt::Debug for Rebuild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rebuild")
            .field("options", &self.driver.options.name)
            .finish()
    }
}

/// Warn once when CommonJS output targets a Node line that has stable
/// require(esm) support.
fn warn_legacy_cjs(options: &ResolvedOptions) {
    if !options.format.contains(&Format::Cjs) {
        return;
    }
    let Some(targets) = &options.target else {
        return;
    };
    if has_modern_node_target(targets) {
        warn!(
            "the configured Node target supports ESM everywhere; consider \
             publishing the ESM format instead of CommonJS"
        );
    }
}

/// Checked once before the first cycle: watch mode with the default watch
/// root cannot share a directory with the build output.
pub fn ensure_watchable(options: &ResolvedOptions) -> Result<()> {
    if matches!(options.watch, WatchMode::Default) && options.out_dir == options.cwd {
        return Err(BuildError::Config(
            bindle_config::ConfigError::InvalidValue {
                field: "watch",
                message: format!(
                    "watch is enabled but the output directory equals the working \
                     directory ({}); set outDir or give watch an explicit path",
                    options.cwd.display()
                ),
            },
        ));
    }
    Ok(())
}
