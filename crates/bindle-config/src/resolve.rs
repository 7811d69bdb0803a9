//! Per-target configuration resolution.
//!
//! `resolve_options` runs the whole pipeline: load config file(s), expand
//! the workspace, then resolve every normalized configuration independently.
//! `resolve_config` fills in each field with validated, defaulted,
//! cross-referenced values and produces the immutable [`ResolvedOptions`]
//! a build driver owns for its lifetime.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use path_clean::PathClean;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::clean::resolve_clean;
use crate::discovery::load_config_file;
use crate::entry::resolve_entry;
use crate::error::{ConfigError, Result};
use crate::options::{
    AttwConfig, BoolOr, CopySpec, DtsConfig, ExportsConfig, Format, FromViteSpec, IgnorePattern,
    MatchPattern, NodeProtocol, OneOrMany, Platform, PluginSpec, PublintConfig, ReportConfig,
    UserConfig, WatchSpec, WorkspaceSpec, normalize_format,
};
use crate::package::{PackageJson, read_package_json, wants_declarations};
use crate::target::resolve_target;
use crate::tsconfig::resolve_tsconfig;
use crate::workspace::{NormalizedUserConfig, resolve_workspace};

/// Future returned by a success callback.
pub type SuccessFuture =
    Pin<Box<dyn Future<Output = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send>>;

/// A user-supplied callback run after a successful build cycle. It receives
/// the resolved options and a cancellation token that fires when the next
/// cycle starts.
#[derive(Clone)]
pub struct SuccessCallback(
    pub Arc<dyn Fn(Arc<ResolvedOptions>, CancellationToken) -> SuccessFuture + Send + Sync>,
);

impl fmt::Debug for SuccessCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SuccessCallback(..)")
    }
}

/// What to run after a successful build cycle.
#[derive(Debug, Clone)]
pub enum SuccessAction {
    /// Shell command, spawned with inherited stdio and terminated (process
    /// tree included) when the next cycle begins.
    Command(String),
    /// In-process callback, awaited with a cancellation token.
    Callback(SuccessCallback),
}

/// Resolved watch mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchMode {
    Off,
    /// Watch the working directory.
    Default,
    /// Watch explicit roots.
    Paths(Vec<PathBuf>),
}

impl WatchMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// One copy operation, fully resolved.
#[derive(Debug, Clone)]
pub struct CopyEntry {
    pub from: PathBuf,
    /// Defaults to the output directory when unset.
    pub to: Option<PathBuf>,
}

/// The authoritative, fully-defaulted configuration for exactly one build
/// target. Exclusively owned by one build driver; read-only after
/// resolution.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub name: Option<String>,
    pub cwd: PathBuf,
    pub entry: BTreeMap<String, PathBuf>,
    pub format: Vec<Format>,
    pub out_dir: PathBuf,
    pub clean: Vec<String>,
    pub platform: Platform,
    pub target: Option<Vec<String>>,
    pub tsconfig: Option<PathBuf>,
    pub dts: Option<DtsConfig>,
    pub exports: Option<ExportsConfig>,
    pub publint: Option<PublintConfig>,
    pub attw: Option<AttwConfig>,
    pub report: Option<ReportConfig>,
    pub sourcemap: bool,
    pub minify: bool,
    pub treeshake: bool,
    pub unbundle: bool,
    pub shims: bool,
    pub skip_node_modules_bundle: bool,
    pub global_name: Option<String>,
    pub env: BTreeMap<String, Value>,
    pub define: BTreeMap<String, String>,
    pub alias: BTreeMap<String, String>,
    pub external: Vec<MatchPattern>,
    pub no_external: Vec<MatchPattern>,
    pub node_protocol: NodeProtocol,
    pub hash: bool,
    pub watch: WatchMode,
    pub ignore_watch: Vec<IgnorePattern>,
    pub copy: Vec<CopyEntry>,
    pub on_success: Option<SuccessAction>,
    pub plugins: Vec<PluginSpec>,
    pub loader: BTreeMap<String, String>,
    pub cjs_default: bool,
    pub pkg: Option<PackageJson>,
}

/// Result of the full resolution pipeline. Per-target failures do not abort
/// siblings, so each slot carries its own `Result`.
#[derive(Debug)]
pub struct ResolveResult {
    pub configs: Vec<Result<ResolvedOptions>>,
    /// Config files that were read, for watch registration.
    pub files: Vec<PathBuf>,
}

/// Run the whole pipeline: config file loading, workspace expansion, and
/// independent per-target resolution.
pub fn resolve_options(
    options: &UserConfig,
    config_file: Option<&Path>,
    no_config: bool,
) -> Result<ResolveResult> {
    let root_cwd = match options.cwd.clone() {
        Some(cwd) if cwd.is_absolute() => cwd.clean(),
        Some(cwd) => std::env::current_dir()?.join(cwd).clean(),
        None => std::env::current_dir()?,
    };

    let (root_configs, file) = load_config_file(&root_cwd, config_file, no_config)?;
    let mut files = Vec::new();
    if let Some(file) = &file {
        debug!("loaded root config file {}", file.display());
        files.push(file.clone());
    }

    let mut configs = Vec::new();
    for root_config in &root_configs {
        let (members, workspace_files) = resolve_workspace(root_config, options, &root_cwd)?;
        files.extend(workspace_files);
        for member in members {
            // workspace members without any entry produce no build target;
            // a single target with workspace disabled still errors on a
            // missing entry during resolution
            let in_workspace = member
                .config
                .workspace
                .as_ref()
                .is_some_and(|spec| !matches!(spec, WorkspaceSpec::Flag(false)));
            if in_workspace && member.config.entry.is_none() {
                debug!(
                    "skipping workspace member without entry: {}",
                    member.cwd.display()
                );
                continue;
            }
            configs.push(resolve_config(member));
        }
    }

    Ok(ResolveResult { configs, files })
}

/// Resolve one normalized configuration into [`ResolvedOptions`], or fail
/// with a configuration error that affects only this target.
pub fn resolve_config(normalized: NormalizedUserConfig) -> Result<ResolvedOptions> {
    let NormalizedUserConfig { config: user, cwd } = normalized;
    let cwd = cwd.clean();

    if user.node_protocol.is_some() && user.remove_node_protocol.is_some() {
        return Err(ConfigError::ConflictingOptions {
            current: "nodeProtocol",
            deprecated: "removeNodeProtocol",
        });
    }
    if user.public_dir.is_some() && user.copy.is_some() {
        return Err(ConfigError::ConflictingOptions {
            current: "copy",
            deprecated: "publicDir",
        });
    }

    if user.bundle.is_some() {
        warn!("`bundle` option is deprecated, use `unbundle` instead");
    }
    let unbundle = user
        .unbundle
        .or(user.bundle.map(|bundle| !bundle))
        .unwrap_or(false);

    let node_protocol = match (user.node_protocol, user.remove_node_protocol) {
        (Some(value), _) => value.resolve(),
        (None, Some(true)) => NodeProtocol::Strip,
        (None, _) => NodeProtocol::Off,
    };

    let out_dir = {
        let out_dir = user.out_dir.clone().unwrap_or_else(|| PathBuf::from("dist"));
        if out_dir.is_absolute() {
            out_dir.clean()
        } else {
            cwd.join(out_dir).clean()
        }
    };
    let clean = resolve_clean(user.clean.as_ref(), &out_dir, &cwd)?;

    let pkg = read_package_json(&cwd)?;
    let mut name = user.name.clone();
    if user.workspace.is_some() {
        name = name.or_else(|| pkg.as_ref().and_then(|pkg| pkg.name.clone()));
    }

    let entry = resolve_entry(user.entry.as_ref(), &cwd, name.as_deref())?;

    let format = match &user.format {
        None => vec![Format::Es],
        Some(values) => {
            let formats = normalize_format(&values.clone().into_vec())?;
            if formats.is_empty() {
                vec![Format::Es]
            } else {
                formats
            }
        }
    };

    let dts = match user.dts.clone() {
        Some(value) => value.resolve(),
        None => wants_declarations(pkg.as_ref()).then(DtsConfig::default),
    };

    let target = resolve_target(
        user.target.clone().map(OneOrMany::into_vec),
        pkg.as_ref(),
    );
    let tsconfig = resolve_tsconfig(user.tsconfig.as_ref(), &cwd)?;

    let mut alias_value = user.alias.clone();
    let mut plugins = user.plugins.clone().unwrap_or_default();
    if let Some(from_vite) = &user.from_vite {
        if let Some(imported) = load_vite_config(from_vite, &cwd)? {
            let mut merged = imported.plugins;
            merged.append(&mut plugins);
            plugins = merged;
            if let Some(alias) = imported.alias {
                ensure_alias_is_map(&alias, &imported.path)?;
                alias_value = Some(alias);
            }
        }
    }
    let alias = resolve_alias(alias_value.as_ref(), &cwd)?;

    let external = compile_patterns(user.external.clone())?;
    let no_external = compile_patterns(user.no_external.clone())?;

    let ignore_watch = user
        .ignore_watch
        .clone()
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .map(|pattern| match MatchPattern::compile(&pattern)? {
            MatchPattern::Regex(regex) => Ok(IgnorePattern::Pattern(regex)),
            MatchPattern::Literal(literal) => {
                Ok(IgnorePattern::Path(absolutize(&cwd, Path::new(&literal))))
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let watch = match user.watch.clone() {
        None | Some(WatchSpec::Flag(false)) => WatchMode::Off,
        Some(WatchSpec::Flag(true)) => WatchMode::Default,
        Some(WatchSpec::Paths(paths)) => WatchMode::Paths(
            paths
                .into_vec()
                .iter()
                .map(|path| absolutize(&cwd, Path::new(path)))
                .collect(),
        ),
    };

    let mut copy = Vec::new();
    if let Some(public_dir) = &user.public_dir {
        warn!("`publicDir` is deprecated, use `copy` instead");
        copy.push(CopyEntry {
            from: absolutize(&cwd, public_dir),
            to: None,
        });
    }
    for spec in user.copy.clone().map(OneOrMany::into_vec).unwrap_or_default() {
        copy.push(match spec {
            CopySpec::Source(from) => CopyEntry {
                from: absolutize(&cwd, Path::new(&from)),
                to: None,
            },
            CopySpec::Pair { from, to } => CopyEntry {
                from: absolutize(&cwd, Path::new(&from)),
                to: Some(absolutize(&cwd, Path::new(&to))),
            },
        });
    }

    let on_success = match (&user.on_success_callback, &user.on_success) {
        (Some(callback), _) => Some(SuccessAction::Callback(callback.clone())),
        (None, Some(command)) => Some(SuccessAction::Command(command.clone())),
        (None, None) => None,
    };

    Ok(ResolvedOptions {
        name,
        cwd,
        entry,
        format,
        out_dir,
        clean,
        platform: user.platform.unwrap_or_default(),
        target,
        tsconfig,
        dts,
        exports: user.exports.clone().and_then(BoolOr::resolve),
        publint: user.publint.clone().and_then(BoolOr::resolve),
        attw: user.attw.clone().and_then(BoolOr::resolve),
        report: match user.report.clone() {
            Some(value) => value.resolve(),
            None => Some(ReportConfig::default()),
        },
        sourcemap: user.sourcemap.unwrap_or(false),
        minify: user.minify.unwrap_or(false),
        treeshake: user.treeshake.unwrap_or(true),
        unbundle,
        shims: user.shims.unwrap_or(false),
        skip_node_modules_bundle: user.skip_node_modules_bundle.unwrap_or(false),
        global_name: user.global_name.clone(),
        env: user.env.clone().unwrap_or_default(),
        define: user.define.clone().unwrap_or_default(),
        alias,
        external,
        no_external,
        node_protocol,
        hash: user.hash.unwrap_or(true),
        watch,
        ignore_watch,
        copy,
        on_success,
        plugins,
        loader: user.loader.clone().unwrap_or_default(),
        cjs_default: user.cjs_default.unwrap_or(true),
        pkg,
    })
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.clean()
    } else {
        cwd.join(path).clean()
    }
}

fn compile_patterns(values: Option<OneOrMany<String>>) -> Result<Vec<MatchPattern>> {
    values
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .iter()
        .map(|value| MatchPattern::compile(value))
        .collect()
}

fn ensure_alias_is_map(alias: &Value, source: &Path) -> Result<()> {
    if alias.is_array() {
        return Err(ConfigError::UnsupportedShape {
            path: source.to_path_buf(),
            field: "resolve.alias",
            expected: "a mapping from alias to replacement, not an ordered list",
        });
    }
    Ok(())
}

fn resolve_alias(alias: Option<&Value>, cwd: &Path) -> Result<BTreeMap<String, String>> {
    let Some(alias) = alias else {
        return Ok(BTreeMap::new());
    };
    ensure_alias_is_map(alias, cwd)?;
    let Some(table) = alias.as_object() else {
        return Err(ConfigError::UnsupportedShape {
            path: cwd.to_path_buf(),
            field: "alias",
            expected: "a mapping from alias to replacement",
        });
    };
    let mut resolved = BTreeMap::new();
    for (key, value) in table {
        let Some(replacement) = value.as_str() else {
            return Err(ConfigError::InvalidValue {
                field: "alias",
                message: format!("replacement for '{key}' must be a string"),
            });
        };
        resolved.insert(key.clone(), replacement.to_string());
    }
    Ok(resolved)
}

/// Recognized fields imported from an external bundler-ecosystem config.
struct ImportedConfig {
    path: PathBuf,
    plugins: Vec<PluginSpec>,
    alias: Option<Value>,
}

/// Read the recognized fields (`plugins`, `resolve.alias`) from a sibling
/// `vite.config.json`-style file. Anything else in the file is ignored;
/// recognized fields with unsupported shapes are fatal.
fn load_vite_config(spec: &FromViteSpec, cwd: &Path) -> Result<Option<ImportedConfig>> {
    let stem = match spec {
        FromViteSpec::Flag(false) => return Ok(None),
        FromViteSpec::Flag(true) => "vite",
        FromViteSpec::Stem(stem) => stem.as_str(),
    };
    let path = cwd.join(format!("{stem}.config.json"));
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("no {} found, skipping import", path.display());
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    let value: Value = serde_json::from_str(&content).map_err(|err| ConfigError::ParseFailed {
        path: path.clone(),
        message: err.to_string(),
    })?;

    let mut plugins = Vec::new();
    if let Some(raw) = value.get("plugins") {
        let Some(items) = raw.as_array() else {
            return Err(ConfigError::UnsupportedShape {
                path,
                field: "plugins",
                expected: "a list of plugin names or { name, options } tables",
            });
        };
        for item in items {
            match serde_json::from_value::<PluginSpec>(item.clone()) {
                Ok(spec) => plugins.push(spec),
                Err(_) => {
                    return Err(ConfigError::UnsupportedShape {
                        path: path.clone(),
                        field: "plugins",
                        expected: "a list of plugin names or { name, options } tables",
                    });
                }
            }
        }
    }

    let alias = value
        .get("resolve")
        .and_then(|resolve| resolve.get("alias"))
        .cloned();

    Ok(Some(ImportedConfig {
        path,
        plugins,
        alias,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{CleanSpec, EntrySpec, NodeProtocolValue, WorkspaceSpec};
    use std::fs;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn project() -> (tempfile::TempDir, UserConfig) {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("index.ts"), "export const hello = \"world\"");
        let config = UserConfig {
            entry: Some(EntrySpec::One("index.ts".into())),
            ..UserConfig::default()
        };
        (dir, config)
    }

    fn resolve(dir: &tempfile::TempDir, config: UserConfig) -> Result<ResolvedOptions> {
        resolve_config(NormalizedUserConfig {
            config,
            cwd: dir.path().to_path_buf(),
        })
    }

    #[test]
    fn empty_options_get_full_defaults() {
        let (dir, config) = project();
        let resolved = resolve(&dir, config).unwrap();

        assert_eq!(resolved.format, vec![Format::Es]);
        assert_eq!(resolved.out_dir, dir.path().join("dist").clean());
        assert_eq!(
            resolved.clean,
            vec![dir.path().join("dist").clean().to_string_lossy().into_owned()]
        );
        assert!(resolved.hash);
        assert!(resolved.treeshake);
        assert!(resolved.cjs_default);
        assert!(resolved.report.is_some());
        assert!(resolved.dts.is_none());
        assert_eq!(resolved.watch, WatchMode::Off);
        assert_eq!(resolved.node_protocol, NodeProtocol::Off);
    }

    #[test]
    fn node_protocol_conflict_is_fatal() {
        let (dir, mut config) = project();
        config.node_protocol = Some(NodeProtocolValue::Strip);
        config.remove_node_protocol = Some(false);
        let err = resolve(&dir, config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ConflictingOptions {
                current: "nodeProtocol",
                ..
            }
        ));
    }

    #[test]
    fn remove_node_protocol_maps_to_strip() {
        let (dir, mut config) = project();
        config.remove_node_protocol = Some(true);
        let resolved = resolve(&dir, config).unwrap();
        assert_eq!(resolved.node_protocol, NodeProtocol::Strip);

        let (dir, mut config) = project();
        config.remove_node_protocol = Some(false);
        let resolved = resolve(&dir, config).unwrap();
        assert_eq!(resolved.node_protocol, NodeProtocol::Off);
    }

    #[test]
    fn public_dir_conflicts_with_copy() {
        let (dir, mut config) = project();
        config.public_dir = Some(PathBuf::from("public"));
        config.copy = Some(OneOrMany::One(CopySpec::Source("assets".into())));
        let err = resolve(&dir, config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ConflictingOptions { current: "copy", .. }
        ));
    }

    #[test]
    fn public_dir_alone_maps_onto_copy() {
        let (dir, mut config) = project();
        config.public_dir = Some(PathBuf::from("public"));
        let resolved = resolve(&dir, config).unwrap();
        assert_eq!(resolved.copy.len(), 1);
        assert_eq!(resolved.copy[0].from, dir.path().join("public").clean());
    }

    #[test]
    fn deprecated_bundle_flips_unbundle() {
        let (dir, mut config) = project();
        config.bundle = Some(false);
        let resolved = resolve(&dir, config).unwrap();
        assert!(resolved.unbundle);

        let (dir, mut config) = project();
        config.bundle = Some(true);
        let resolved = resolve(&dir, config).unwrap();
        assert!(!resolved.unbundle);
    }

    #[test]
    fn dts_auto_detects_exports_types() {
        let (dir, config) = project();
        write(
            &dir.path().join("package.json"),
            r#"{ "name": "x", "exports": { ".": { "types": "./dist/index.d.ts" } } }"#,
        );
        let resolved = resolve(&dir, config).unwrap();
        assert!(resolved.dts.is_some());
    }

    #[test]
    fn dts_not_detected_for_string_dot_export() {
        let (dir, config) = project();
        write(
            &dir.path().join("package.json"),
            r#"{ "name": "x", "exports": { ".": "./dist/index.mjs" } }"#,
        );
        let resolved = resolve(&dir, config).unwrap();
        assert!(resolved.dts.is_none());
    }

    #[test]
    fn clean_cwd_fails_before_any_build() {
        let (dir, mut config) = project();
        config.clean = Some(CleanSpec::Patterns(vec![".".into()]));
        let err = resolve(&dir, config).unwrap_err();
        assert!(matches!(err, ConfigError::CleanCwd(_)));
    }

    #[test]
    fn vite_alias_array_is_unsupported() {
        let (dir, mut config) = project();
        write(
            &dir.path().join("vite.config.json"),
            r#"{ "resolve": { "alias": [ { "find": "@", "replacement": "./src" } ] } }"#,
        );
        config.from_vite = Some(FromViteSpec::Flag(true));
        let err = resolve(&dir, config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedShape {
                field: "resolve.alias",
                ..
            }
        ));
    }

    #[test]
    fn vite_plugins_and_alias_merge() {
        let (dir, mut config) = project();
        write(
            &dir.path().join("vite.config.json"),
            r#"{ "plugins": ["legacy"], "resolve": { "alias": { "@": "./src" } } }"#,
        );
        config.from_vite = Some(FromViteSpec::Flag(true));
        config.plugins = Some(vec![PluginSpec::Name("mine".into())]);
        let resolved = resolve(&dir, config).unwrap();
        let names: Vec<&str> = resolved.plugins.iter().map(PluginSpec::name).collect();
        assert_eq!(names, vec!["legacy", "mine"]);
        assert_eq!(resolved.alias["@"], "./src");
    }

    #[test]
    fn workspace_round_trip_resolves_independent_cwds() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("package.json"), r#"{ "name": "root" }"#);
        write(&root.join("packages/foo/package.json"), r#"{ "name": "foo" }"#);
        write(&root.join("packages/foo/src/index.ts"), "export {}");
        write(&root.join("packages/bar/package.json"), r#"{ "name": "bar" }"#);
        write(
            &root.join("packages/bar/bindle.toml"),
            "entry = \"index.ts\"\n",
        );
        write(&root.join("packages/bar/index.ts"), "export {}");

        let options = UserConfig {
            cwd: Some(root.to_path_buf()),
            workspace: Some(WorkspaceSpec::Flag(true)),
            entry: Some(EntrySpec::One("src/index.ts".into())),
            ..UserConfig::default()
        };
        let result = resolve_options(&options, None, true).unwrap();
        let mut resolved: Vec<ResolvedOptions> = result
            .configs
            .into_iter()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        resolved.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].name.as_deref(), Some("bar"));
        assert_eq!(resolved[0].cwd, root.join("packages/bar").clean());
        assert_eq!(
            resolved[0].entry.values().next().unwrap(),
            &root.join("packages/bar/index.ts").clean()
        );
        assert_eq!(resolved[1].name.as_deref(), Some("foo"));
        assert_eq!(resolved[1].cwd, root.join("packages/foo").clean());
    }

    /// Members with neither an inherited nor a local entry produce no build
    /// target and no error.
    #[test]
    fn entryless_workspace_members_are_dropped_silently() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("package.json"), r#"{ "name": "root" }"#);
        write(&root.join("packages/lib/package.json"), r#"{ "name": "lib" }"#);
        write(
            &root.join("packages/lib/bindle.toml"),
            "entry = \"index.ts\"\n",
        );
        write(&root.join("packages/lib/index.ts"), "export {}");
        write(
            &root.join("packages/docs/package.json"),
            r#"{ "name": "docs" }"#,
        );

        let options = UserConfig {
            cwd: Some(root.to_path_buf()),
            workspace: Some(WorkspaceSpec::Flag(true)),
            ..UserConfig::default()
        };
        let result = resolve_options(&options, None, true).unwrap();
        assert_eq!(result.configs.len(), 1);
        let only = result.configs.into_iter().next().unwrap().unwrap();
        assert_eq!(only.name.as_deref(), Some("lib"));
    }

    #[test]
    fn sibling_failure_does_not_abort_others() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("package.json"), r#"{ "name": "root" }"#);
        write(&root.join("packages/ok/package.json"), r#"{ "name": "ok" }"#);
        write(&root.join("packages/ok/index.ts"), "export {}");
        write(
            &root.join("packages/broken/package.json"),
            r#"{ "name": "broken" }"#,
        );
        // entry is inherited but the file only exists in `ok`

        let options = UserConfig {
            cwd: Some(root.to_path_buf()),
            workspace: Some(WorkspaceSpec::Flag(true)),
            entry: Some(EntrySpec::One("index.ts".into())),
            ..UserConfig::default()
        };
        let result = resolve_options(&options, None, true).unwrap();
        assert_eq!(result.configs.len(), 2);
        assert_eq!(result.configs.iter().filter(|c| c.is_ok()).count(), 1);
        assert_eq!(result.configs.iter().filter(|c| c.is_err()).count(), 1);
    }
}
