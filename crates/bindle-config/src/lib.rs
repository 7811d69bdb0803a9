//! Configuration normalization and resolution for the bindle bundler.
//!
//! The pipeline: a raw [`UserConfig`] (config file, CLI flags, or built
//! programmatically) is merged and expanded across workspace members by the
//! option normalizer, then each normalized configuration is resolved
//! independently into an immutable [`ResolvedOptions`].

pub mod clean;
pub mod discovery;
pub mod entry;
pub mod error;
pub mod glob;
pub mod options;
pub mod package;
pub mod resolve;
pub mod target;
pub mod tsconfig;
pub mod workspace;

pub use clean::resolve_clean;
pub use discovery::{CONFIG_FILE, find_config_file, is_config_file_name, load_config_file};
pub use error::{ConfigError, Result};
pub use options::{
    AttwConfig, BoolOr, CleanSpec, CopySpec, DtsConfig, EntrySpec, ExportsConfig, Format,
    FromViteSpec, IgnorePattern, MatchPattern, NodeProtocol, NodeProtocolValue, OneOrMany,
    Platform, PluginSpec, PublintConfig, ReportConfig, TsconfigSpec, UserConfig, WatchSpec,
    WorkspaceSpec, normalize_format,
};
pub use package::{PackageJson, has_exports_types, read_package_json, wants_declarations};
pub use resolve::{
    CopyEntry, ResolveResult, ResolvedOptions, SuccessAction, SuccessCallback, SuccessFuture,
    WatchMode, resolve_config, resolve_options,
};
pub use target::{has_modern_node_target, resolve_target};
pub use tsconfig::{find_tsconfig, resolve_tsconfig};
pub use workspace::{DEFAULT_EXCLUDE_WORKSPACE, NormalizedUserConfig, resolve_workspace};
