//! Build lifecycle hooks.
//!
//! Three extension points fire per rebuild cycle: `build:prepare` before
//! anything happens, `build:before` once per format with the constructed
//! engine request, and `build:done` after post-processing. Handlers run
//! sequentially in registration order and share one mutable context owned
//! by the driver; a handler error aborts that cycle only.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use bindle_config::ResolvedOptions;

use crate::engine::EngineRequest;
use crate::error::{BuildError, Result};

/// Mutable state threaded through one driver's hook invocations. Never
/// shared across sibling configurations.
#[derive(Debug)]
pub struct HookContext {
    pub options: Arc<ResolvedOptions>,
    /// Free-form scratch space for hook handlers.
    pub values: BTreeMap<String, Value>,
}

impl HookContext {
    pub fn new(options: Arc<ResolvedOptions>) -> Self {
        Self {
            options,
            values: BTreeMap::new(),
        }
    }
}

/// One registered lifecycle hook. All methods default to no-ops, so
/// implementers override only the stages they care about.
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    async fn prepare(&self, _context: &mut HookContext) -> Result<()> {
        Ok(())
    }

    async fn before(&self, _context: &mut HookContext, _request: &EngineRequest) -> Result<()> {
        Ok(())
    }

    async fn done(&self, _context: &mut HookContext) -> Result<()> {
        Ok(())
    }
}

/// Ordered hook registry.
#[derive(Default)]
pub struct Hooks {
    handlers: Vec<Arc<dyn LifecycleHook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, hook: Arc<dyn LifecycleHook>) -> &mut Self {
        self.handlers.push(hook);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub async fn call_prepare(&self, context: &mut HookContext) -> Result<()> {
        for handler in &self.handlers {
            handler
                .prepare(context)
                .await
                .map_err(|err| hook_error("build:prepare", err))?;
        }
        Ok(())
    }

    pub async fn call_before(
        &self,
        context: &mut HookContext,
        request: &EngineRequest,
    ) -> Result<()> {
        for handler in &self.handlers {
            handler
                .before(context, request)
                .await
                .map_err(|err| hook_error("build:before", err))?;
        }
        Ok(())
    }

    pub async fn call_done(&self, context: &mut HookContext) -> Result<()> {
        for handler in &self.handlers {
            handler
                .done(context)
                .await
                .map_err(|err| hook_error("build:done", err))?;
        }
        Ok(())
    }
}

fn hook_error(hook: &'static str, err: BuildError) -> BuildError {
    match err {
        already @ BuildError::Hook { .. } => already,
        other => BuildError::Hook {
            hook,
            message: other.to_string(),
        },
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
