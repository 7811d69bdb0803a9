//! Command-line surface.
//!
//! One flat command: `bindle [entries...] [flags]`. Flags only override what
//! the user actually passed; everything else defers to the config file and
//! the resolver's defaults.

use std::path::PathBuf;

use clap::Parser;

use bindle_config::{
    BoolOr, CleanSpec, EntrySpec, OneOrMany, Platform, UserConfig, WatchSpec, WorkspaceSpec,
};

/// Bundle libraries with rolldown: config resolution, multi-format builds,
/// watch mode, and post-build checks.
#[derive(Parser, Debug)]
#[command(name = "bindle", version, about)]
pub struct Cli {
    /// Entry points to bundle
    ///
    /// Overrides the config file's entry declaration when given.
    #[arg(value_name = "ENTRY")]
    pub entry: Vec<String>,

    /// Path to the config file (defaults to bindle.toml discovery)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip config file loading entirely
    #[arg(long, conflicts_with = "config")]
    pub no_config: bool,

    /// Working directory for resolution and builds
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Output formats (es, cjs, iife, umd); repeatable
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Vec<String>,

    /// Output directory
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Skip cleaning stale artifacts before building
    #[arg(long)]
    pub no_clean: bool,

    /// Target platform for resolution (node, browser, neutral)
    #[arg(long, value_enum)]
    pub platform: Option<PlatformArg>,

    /// Transform targets, e.g. es2020 or node18; repeatable
    #[arg(long, value_name = "TARGET")]
    pub target: Vec<String>,

    /// Emit TypeScript declaration files
    #[arg(long)]
    pub dts: bool,

    /// Emit source maps
    #[arg(long)]
    pub sourcemap: bool,

    /// Minify output
    #[arg(long)]
    pub minify: bool,

    /// Global variable name for iife/umd output
    #[arg(long, value_name = "NAME")]
    pub global_name: Option<String>,

    /// Externalize an import specifier; repeatable
    #[arg(long, value_name = "PATTERN")]
    pub external: Vec<String>,

    /// Watch for changes and rebuild
    #[arg(short, long)]
    pub watch: bool,

    /// Treat the working directory as a workspace root
    #[arg(long)]
    pub workspace: bool,

    /// Narrow workspace members by substring or /regex/; repeatable
    #[arg(long, value_name = "FILTER")]
    pub filter: Vec<String>,

    /// Update the package export map after building
    #[arg(long)]
    pub exports: bool,

    /// Run the packaging lint after building
    #[arg(long)]
    pub publint: bool,

    /// Run the type-compatibility check after building
    #[arg(long)]
    pub attw: bool,

    /// Disable the per-chunk size report
    #[arg(long)]
    pub no_report: bool,

    /// Command to run after each successful build
    #[arg(long, value_name = "COMMAND")]
    pub on_success: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PlatformArg {
    Node,
    Browser,
    Neutral,
}

impl From<PlatformArg> for Platform {
    fn from(value: PlatformArg) -> Self {
        match value {
            PlatformArg::Node => Platform::Node,
            PlatformArg::Browser => Platform::Browser,
            PlatformArg::Neutral => Platform::Neutral,
        }
    }
}

impl Cli {
    /// The CLI overrides as a partial user config; only flags that were
    /// actually given produce values.
    pub fn overrides(&self) -> UserConfig {
        UserConfig {
            entry: (!self.entry.is_empty()).then(|| EntrySpec::Many(self.entry.clone())),
            cwd: self.cwd.clone(),
            format: (!self.format.is_empty()).then(|| OneOrMany::Many(self.format.clone())),
            out_dir: self.out_dir.clone(),
            clean: self.no_clean.then_some(CleanSpec::Flag(false)),
            platform: self.platform.map(Into::into),
            target: (!self.target.is_empty()).then(|| OneOrMany::Many(self.target.clone())),
            dts: self.dts.then_some(BoolOr::Flag(true)),
            sourcemap: self.sourcemap.then_some(true),
            minify: self.minify.then_some(true),
            global_name: self.global_name.clone(),
            external: (!self.external.is_empty())
                .then(|| OneOrMany::Many(self.external.clone())),
            watch: self.watch.then_some(WatchSpec::Flag(true)),
            workspace: self.workspace.then_some(WorkspaceSpec::Flag(true)),
            filter: (!self.filter.is_empty()).then(|| OneOrMany::Many(self.filter.clone())),
            exports: self.exports.then_some(BoolOr::Flag(true)),
            publint: self.publint.then_some(BoolOr::Flag(true)),
            attw: self.attw.then_some(BoolOr::Flag(true)),
            report: self.no_report.then_some(BoolOr::Flag(false)),
            on_success: self.on_success.clone(),
            ..UserConfig::default()
        }
    }
}
