//! Build orchestration for bindle.
//!
//! Takes [`bindle_config::ResolvedOptions`] and drives the bundler engine:
//! clean, concurrent per-format builds, artifact writing, post-processing
//! (export maps, copies, lint checks), lifecycle hooks, and cooperative
//! cancellation of success actions across rebuild cycles.

pub mod clean;
pub mod copy;
pub mod driver;
pub mod engine;
pub mod error;
pub mod exports;
pub mod hooks;
pub mod lint;
pub mod options;
pub mod output;
pub mod plugins;
pub mod report;
pub mod success;

pub use clean::{CleanTrigger, clean_targets};
pub use driver::{BuildChunks, BuildDriver, Rebuild, ensure_watchable};
pub use engine::{
    Engine, EngineOutput, EngineRequest, InputEntry, OutputFile, OutputKind, RolldownEngine,
};
pub use error::{BuildError, Result};
pub use hooks::{HookContext, Hooks, LifecycleHook};
pub use lint::ExitFlag;
pub use options::build_request;
pub use output::{entry_filename, write_files};

// Re-export engine plugin types for plugin authors
pub use rolldown_plugin::{
    HookResolveIdArgs, HookResolveIdOutput, HookResolveIdReturn, HookUsage, Plugin, PluginContext,
    __inner::SharedPluginable,
};
