//! Per-format engine request construction.
//!
//! Mirrors the resolution order the driver relies on: protocol rewriting
//! first, then declaration emission, then user plugins. The declaration-only
//! CommonJS pass (`cjs_dts`) reuses the cjs naming so declaration filenames
//! line up with the code files, but drops user plugins and minification.

use std::path::PathBuf;
use std::sync::Arc;

use rolldown_plugin::__inner::SharedPluginable;

use bindle_config::{Format, MatchPattern, NodeProtocol, Platform, ResolvedOptions};

use crate::engine::{EngineRequest, InputEntry};
use crate::output::{
    chunk_filename_template, dts_extension, entry_filename_template, js_extension,
};
use crate::plugins::{DtsPlugin, DtsPluginOptions, NodeProtocolPlugin};

/// Build the declarative engine request for one format of one
/// configuration.
pub fn build_request(
    options: &ResolvedOptions,
    format: Format,
    multi_format: bool,
    cjs_dts: bool,
) -> EngineRequest {
    let pkg_is_module = options.pkg.as_ref().is_some_and(|pkg| pkg.is_module());

    let mut plugins: Vec<SharedPluginable> = Vec::new();

    if options.node_protocol != NodeProtocol::Off {
        plugins.push(Arc::new(NodeProtocolPlugin::new(options.node_protocol)));
    }

    if let Some(dts) = &options.dts {
        if format == Format::Es || cjs_dts {
            let naming_format = if cjs_dts { Format::Cjs } else { format };
            plugins.push(Arc::new(DtsPlugin::new(DtsPluginOptions {
                strip_internal: dts.strip_internal,
                extension: dts_extension(js_extension(naming_format, pkg_is_module)).to_string(),
                dir: dts.dir.clone(),
                emit_dts_only: cjs_dts,
            })));
        }
    }

    if !cjs_dts {
        for spec in &options.plugins {
            match instantiate_plugin(spec, options) {
                Some(plugin) => plugins.push(plugin),
                None => {
                    tracing::warn!("plugin '{}' is not available in this engine", spec.name());
                }
            }
        }
    }

    let naming_format = if cjs_dts { Format::Cjs } else { format };
    let platform = if cjs_dts || format == Format::Cjs {
        Platform::Node
    } else {
        options.platform
    };

    EngineRequest {
        cwd: options.cwd.clone(),
        input: options
            .entry
            .iter()
            .map(|(name, path)| InputEntry {
                name: name.clone(),
                import: path.to_string_lossy().into_owned(),
            })
            .collect(),
        format: Some(format),
        platform: Some(platform),
        external_patterns: external_patterns(options),
        defines: defines(options),
        transform_target: options.target.clone(),
        module_types: options.loader.clone(),
        alias: options.alias.clone(),
        treeshake: options.treeshake,
        sourcemap: options.sourcemap && !cjs_dts,
        minify: options.minify && !cjs_dts,
        global_name: options.global_name.clone(),
        entry_filenames: Some(entry_filename_template(
            naming_format,
            pkg_is_module,
            multi_format,
        )),
        chunk_filenames: Some(chunk_filename_template(
            naming_format,
            pkg_is_module,
            multi_format,
            options.hash,
        )),
        preserve_modules: options.unbundle,
        preserve_modules_root: preserve_modules_root(options),
        cjs_default: options.cjs_default,
        shims: options.shims,
        plugins,
    }
}

/// Preserved module paths are kept relative to the entries' deepest shared
/// directory, so unbundled output mirrors the source layout.
fn preserve_modules_root(options: &ResolvedOptions) -> Option<PathBuf> {
    if !options.unbundle {
        return None;
    }
    let files: Vec<PathBuf> = options.entry.values().cloned().collect();
    bindle_config::entry::lowest_common_ancestor(&files)
}

/// Recognized plugin names. Everything else came from an imported external
/// config (or a typo) and has no counterpart in this engine.
fn instantiate_plugin(
    spec: &bindle_config::PluginSpec,
    options: &ResolvedOptions,
) -> Option<SharedPluginable> {
    match spec.name() {
        "node-protocol" => Some(Arc::new(NodeProtocolPlugin::new(
            if options.node_protocol == NodeProtocol::Off {
                NodeProtocol::Add
            } else {
                options.node_protocol
            },
        ))),
        _ => None,
    }
}

/// Regex sources handed to the engine's external matcher: user patterns,
/// manifest dependencies (minus `noExternal` matches), and the bare-import
/// rule when node_modules bundling is skipped.
fn external_patterns(options: &ResolvedOptions) -> Vec<String> {
    let mut patterns = Vec::new();

    for pattern in &options.external {
        patterns.push(match pattern {
            MatchPattern::Literal(literal) => format!("^{}$", regex::escape(literal)),
            MatchPattern::Regex(regex) => regex.as_str().to_string(),
        });
    }

    if let Some(pkg) = &options.pkg {
        for dependency in pkg.external_dependencies() {
            let kept_internal = options
                .no_external
                .iter()
                .any(|pattern| pattern.is_match(&dependency));
            if kept_internal {
                continue;
            }
            // the dependency itself and any subpath import
            patterns.push(format!("^{}(/.*)?$", regex::escape(&dependency)));
        }
    }

    if options.skip_node_modules_bundle {
        patterns.push("^[^./]".to_string());
    }

    patterns
}

/// Compile-time replacements: user defines plus the JSON-quoted `env`
/// values under both `process.env.*` and `import.meta.env.*`.
fn defines(options: &ResolvedOptions) -> Vec<(String, String)> {
    let mut defines: Vec<(String, String)> = options
        .define
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    for (key, value) in &options.env {
        let serialized = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
        defines.push((format!("process.env.{key}"), serialized.clone()));
        defines.push((format!("import.meta.env.{key}"), serialized));
    }

    defines
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindle_config::{EntrySpec, NormalizedUserConfig, OneOrMany, UserConfig, resolve_config};
    use std::path::Path;

    fn resolved(root: &Path, mutate: impl FnOnce(&mut UserConfig)) -> ResolvedOptions {
        std::fs::write(root.join("index.ts"), "export {}").unwrap();
        let mut user = UserConfig {
            entry: Some(EntrySpec::One("index.ts".into())),
            ..UserConfig::default()
        };
        mutate(&mut user);
        resolve_config(NormalizedUserConfig {
            config: user,
            cwd: root.to_path_buf(),
        })
        .unwrap()
    }

    #[test]
    fn env_values_are_json_quoted_under_both_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        let options = resolved(dir.path(), |user| {
            user.env = Some(
                [("MODE".to_string(), serde_json::json!("prod"))]
                    .into_iter()
                    .collect(),
            );
        });
        let request = build_request(&options, Format::Es, false, false);
        assert!(request
            .defines
            .contains(&("process.env.MODE".to_string(), "\"prod\"".to_string())));
        assert!(request
            .defines
            .contains(&("import.meta.env.MODE".to_string(), "\"prod\"".to_string())));
    }

    #[test]
    fn manifest_dependencies_are_externalized_unless_no_external() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "x", "dependencies": { "react": "^19", "lodash": "^4" } }"#,
        )
        .unwrap();
        let options = resolved(dir.path(), |user| {
            user.no_external = Some(OneOrMany::One("lodash".into()));
        });
        let request = build_request(&options, Format::Es, false, false);
        assert!(request
            .external_patterns
            .iter()
            .any(|p| p.contains("react")));
        assert!(!request
            .external_patterns
            .iter()
            .any(|p| p.contains("lodash")));
    }

    #[test]
    fn cjs_platform_is_forced_to_node() {
        let dir = tempfile::tempdir().unwrap();
        let options = resolved(dir.path(), |user| {
            user.platform = Some(Platform::Browser);
        });
        let request = build_request(&options, Format::Cjs, false, false);
        assert_eq!(request.platform, Some(Platform::Node));
        let request = build_request(&options, Format::Es, false, false);
        assert_eq!(request.platform, Some(Platform::Browser));
    }

    #[test]
    fn cjs_dts_pass_drops_user_plugins_and_minify() {
        let dir = tempfile::tempdir().unwrap();
        let options = resolved(dir.path(), |user| {
            user.minify = Some(true);
            user.dts = Some(bindle_config::BoolOr::Flag(true));
            user.plugins = Some(vec![bindle_config::PluginSpec::Name("node-protocol".into())]);
        });
        let request = build_request(&options, Format::Cjs, false, true);
        assert!(!request.minify);
        // only the declaration plugin remains
        assert_eq!(request.plugins.len(), 1);
        // naming matches the cjs code pass so stems line up
        assert_eq!(request.entry_filenames.as_deref(), Some("[name].js"));
    }

    #[test]
    fn cjs_default_and_unbundle_reach_the_request() {
        let dir = tempfile::tempdir().unwrap();
        let options = resolved(dir.path(), |user| {
            user.cjs_default = Some(false);
            user.unbundle = Some(true);
        });
        let request = build_request(&options, Format::Cjs, false, false);
        assert!(!request.cjs_default);
        assert!(request.preserve_modules);
        assert_eq!(
            request.preserve_modules_root.as_deref(),
            Some(dir.path())
        );

        let options = resolved(dir.path(), |_| {});
        let request = build_request(&options, Format::Cjs, false, false);
        assert!(request.cjs_default);
        assert!(!request.preserve_modules);
        assert!(request.preserve_modules_root.is_none());
    }

    #[test]
    fn iife_request_keeps_global_name() {
        let dir = tempfile::tempdir().unwrap();
        let options = resolved(dir.path(), |user| {
            user.format = Some(OneOrMany::Many(vec!["iife".into(), "umd".into()]));
            user.global_name = Some("Lib".into());
        });
        let request = build_request(&options, Format::Iife, true, false);
        assert_eq!(request.global_name.as_deref(), Some("Lib"));
        assert_eq!(request.entry_filenames.as_deref(), Some("[name].iife.js"));
    }
}
