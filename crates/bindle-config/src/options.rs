//! Raw user configuration.
//!
//! `UserConfig` is the partial, declarative input: it can come from a config
//! file, from CLI flags, or be built programmatically. Every field is
//! optional; `resolve::resolve_config` turns one merged `UserConfig` into an
//! authoritative [`crate::ResolvedOptions`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// One output module convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    /// ECMAScript modules
    Es,
    /// CommonJS
    Cjs,
    /// Immediately invoked function expression
    Iife,
    /// Universal module definition
    Umd,
}

impl Format {
    /// Parse a format alias. Accepts the common spellings for the module
    /// systems (`esm`/`es`/`module`, `cjs`/`commonjs`).
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "es" | "esm" | "module" => Ok(Self::Es),
            "cjs" | "commonjs" => Ok(Self::Cjs),
            "iife" => Ok(Self::Iife),
            "umd" => Ok(Self::Umd),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }

    /// Canonical lowercase name, used for log lines and chunk grouping.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::Cjs => "cjs",
            Self::Iife => "iife",
            Self::Umd => "umd",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a list of format aliases: parse each one and drop duplicates
/// while preserving the first occurrence's position.
pub fn normalize_format(values: &[String]) -> Result<Vec<Format>> {
    let mut formats = Vec::with_capacity(values.len());
    for value in values {
        let format = Format::parse(value)?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    Ok(formats)
}

/// Target platform for module resolution and shims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Node,
    Browser,
    Neutral,
}

/// How `node:` specifiers are rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeProtocol {
    /// Leave specifiers untouched.
    #[default]
    Off,
    /// Remove the `node:` prefix where an unprefixed builtin exists.
    Strip,
    /// Add the `node:` prefix to bare builtin specifiers.
    Add,
}

/// Raw `nodeProtocol` value: `"strip"`, `true` (add) or `false` (off).
#[derive(Debug, Clone, Copy)]
pub enum NodeProtocolValue {
    Flag(bool),
    Strip,
}

impl<'de> Deserialize<'de> for NodeProtocolValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Keyword(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Flag(flag) => Ok(Self::Flag(flag)),
            Raw::Keyword(word) if word == "strip" => Ok(Self::Strip),
            Raw::Keyword(word) => Err(serde::de::Error::custom(format!(
                "expected \"strip\", true or false, got \"{word}\""
            ))),
        }
    }
}

impl NodeProtocolValue {
    pub fn resolve(self) -> NodeProtocol {
        match self {
            Self::Strip => NodeProtocol::Strip,
            Self::Flag(true) => NodeProtocol::Add,
            Self::Flag(false) => NodeProtocol::Off,
        }
    }
}

/// `true`/`false` or an options table. `true` resolves to the default
/// options, `false` to none.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BoolOr<T> {
    Flag(bool),
    Options(T),
}

impl<T: Default> BoolOr<T> {
    pub fn resolve(self) -> Option<T> {
        match self {
            Self::Flag(false) => None,
            Self::Flag(true) => Some(T::default()),
            Self::Options(options) => Some(options),
        }
    }
}

/// A single value or a list of values.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// Entry points: a single pattern, a list of patterns, or an explicit
/// output-name to source-path mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntrySpec {
    One(String),
    Many(Vec<String>),
    Map(BTreeMap<String, String>),
}

/// `clean`: a flag or explicit glob patterns.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CleanSpec {
    Flag(bool),
    Patterns(Vec<String>),
}

/// `watch`: a flag or explicit watch roots.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WatchSpec {
    Flag(bool),
    Paths(OneOrMany<String>),
}

/// `tsconfig`: a flag (auto-discover / disable) or an explicit path.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TsconfigSpec {
    Flag(bool),
    Path(PathBuf),
}

/// One copy operation: a source path (copied into the output directory) or
/// an explicit from/to pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CopySpec {
    Source(String),
    Pair { from: String, to: String },
}

/// Workspace declaration: enable auto-discovery, give include globs, or the
/// detailed form with include/exclude/config.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WorkspaceSpec {
    Flag(bool),
    Include(OneOrMany<String>),
    Detailed {
        #[serde(default)]
        include: Option<OneOrMany<String>>,
        #[serde(default)]
        exclude: Option<Vec<String>>,
        #[serde(default)]
        config: Option<PathBuf>,
    },
}

/// `fromVite`: import recognized fields from a sibling bundler-ecosystem
/// config file. `true` reads `vite.config.json`; a string names the config
/// stem (`"vitest"` reads `vitest.config.json`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FromViteSpec {
    Flag(bool),
    Stem(String),
}

/// A plugin described as data: a name plus an opaque options value. The
/// bundler instantiates the plugins it knows by name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PluginSpec {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        options: serde_json::Value,
    },
}

impl PluginSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Detailed { name, .. } => name,
        }
    }
}

/// Declaration emission options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DtsConfig {
    /// Drop declarations tagged `@internal`.
    pub strip_internal: bool,
    /// Emit declarations into this subdirectory of the output directory.
    pub dir: Option<PathBuf>,
}

/// Package export-map generation options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportsConfig {
    /// Also write `main`/`module`/`types` legacy fields.
    pub legacy: bool,
    /// Write `devExports` instead of mutating `exports` directly.
    pub dev_exports: bool,
}

/// Packaging lint options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublintConfig {
    /// Severity level below which findings are not reported.
    pub level: Option<String>,
}

/// Type-compatibility check options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttwConfig {
    /// Resolution profile passed through to the checker.
    pub profile: Option<String>,
}

/// Size report options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    /// Report gzip sizes as well.
    pub gzip: bool,
}

/// The raw, possibly-partial user configuration.
///
/// All fields are optional so the same shape serves config files, CLI
/// overrides and programmatic use. See `resolve_config` for every default
/// and derivation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserConfig {
    pub name: Option<String>,
    pub cwd: Option<PathBuf>,
    pub entry: Option<EntrySpec>,
    pub format: Option<OneOrMany<String>>,
    pub out_dir: Option<PathBuf>,
    pub clean: Option<CleanSpec>,
    pub platform: Option<Platform>,
    pub target: Option<OneOrMany<String>>,
    pub tsconfig: Option<TsconfigSpec>,
    pub dts: Option<BoolOr<DtsConfig>>,
    pub exports: Option<BoolOr<ExportsConfig>>,
    pub publint: Option<BoolOr<PublintConfig>>,
    pub attw: Option<BoolOr<AttwConfig>>,
    pub report: Option<BoolOr<ReportConfig>>,
    pub sourcemap: Option<bool>,
    pub minify: Option<bool>,
    pub treeshake: Option<bool>,
    /// Deprecated. Use `unbundle` instead.
    pub bundle: Option<bool>,
    pub unbundle: Option<bool>,
    pub shims: Option<bool>,
    pub skip_node_modules_bundle: Option<bool>,
    pub global_name: Option<String>,
    pub env: Option<BTreeMap<String, serde_json::Value>>,
    pub define: Option<BTreeMap<String, String>>,
    pub alias: Option<serde_json::Value>,
    pub external: Option<OneOrMany<String>>,
    pub no_external: Option<OneOrMany<String>>,
    pub node_protocol: Option<NodeProtocolValue>,
    /// Deprecated. Use `nodeProtocol` instead.
    pub remove_node_protocol: Option<bool>,
    pub hash: Option<bool>,
    pub watch: Option<WatchSpec>,
    pub ignore_watch: Option<OneOrMany<String>>,
    pub copy: Option<OneOrMany<CopySpec>>,
    /// Deprecated. Use `copy` instead.
    pub public_dir: Option<PathBuf>,
    pub on_success: Option<String>,
    /// Programmatic alternative to `on_success`: an in-process callback.
    /// Never read from config files.
    #[serde(skip)]
    pub on_success_callback: Option<crate::resolve::SuccessCallback>,
    pub from_vite: Option<FromViteSpec>,
    pub workspace: Option<WorkspaceSpec>,
    pub plugins: Option<Vec<PluginSpec>>,
    pub loader: Option<BTreeMap<String, String>>,
    pub cjs_default: Option<bool>,
    pub filter: Option<OneOrMany<String>>,
}

macro_rules! take_over {
    ($base:ident, $over:ident, $($field:ident),+ $(,)?) => {
        $(if $over.$field.is_some() {
            $base.$field = $over.$field.clone();
        })+
    };
}

impl UserConfig {
    /// Overlay `overrides` (typically CLI flags) on top of this config.
    /// Only fields present in the override win; everything else keeps the
    /// base value.
    pub fn merged_with(&self, overrides: &UserConfig) -> UserConfig {
        let mut base = self.clone();
        take_over!(
            base, overrides, name, cwd, entry, format, out_dir, clean, platform, target, tsconfig,
            dts, exports, publint, attw, report, sourcemap, minify, treeshake, bundle, unbundle,
            shims, skip_node_modules_bundle, global_name, env, define, alias, external, no_external,
            node_protocol, remove_node_protocol, hash, watch, ignore_watch, copy, public_dir,
            on_success, on_success_callback, from_vite, workspace, plugins, loader, cjs_default,
            filter,
        );
        base
    }
}

/// A compiled match predicate for `external`/`noExternal`-style options.
/// Plain strings match specifiers exactly; `/pattern/` strings compile to
/// regular expressions.
#[derive(Debug, Clone)]
pub enum MatchPattern {
    Literal(String),
    Regex(regex::Regex),
}

impl MatchPattern {
    /// Compile a pattern string. `/…/`-delimited strings become regexes,
    /// anything else is an exact match.
    pub fn compile(pattern: &str) -> Result<Self> {
        if let Some(source) = pattern
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
            .filter(|source| !source.is_empty())
        {
            let regex = regex::Regex::new(source).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
            Ok(Self::Regex(regex))
        } else {
            Ok(Self::Literal(pattern.to_string()))
        }
    }

    /// Compile a pre-built regular expression source.
    pub fn regex(source: &str) -> Result<Self> {
        let regex = regex::Regex::new(source).map_err(|err| ConfigError::InvalidPattern {
            pattern: source.to_string(),
            source: err,
        })?;
        Ok(Self::Regex(regex))
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        match self {
            Self::Literal(literal) => literal == candidate,
            Self::Regex(regex) => regex.is_match(candidate),
        }
    }
}

/// A watch-ignore entry: plain strings were normalized to absolute paths,
/// `/pattern/` strings stay match predicates.
#[derive(Debug, Clone)]
pub enum IgnorePattern {
    Path(PathBuf),
    Pattern(regex::Regex),
}

impl IgnorePattern {
    pub fn matches(&self, path: &std::path::Path) -> bool {
        match self {
            Self::Path(prefix) => path.starts_with(prefix),
            Self::Pattern(regex) => regex.is_match(&path.to_string_lossy()),
        }
    }
}
