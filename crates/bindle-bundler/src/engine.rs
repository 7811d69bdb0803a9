//! The bundler engine seam.
//!
//! The engine is an opaque build function: it takes declarative input and
//! output options plus an ordered plugin list, and returns the emitted
//! chunks. This crate never introspects plugin internals or the engine's
//! module graph; everything downstream (writing, export maps, reports)
//! works from [`EngineOutput`].
//!
//! [`RolldownEngine`] is the production implementation. Tests inject their
//! own [`Engine`] to observe orchestration without bundling anything.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use rolldown::{Bundler, BundlerBuilder, BundlerOptions, InputItem, IsExternal, ResolveOptions};
use rolldown_common::{ModuleType, Output, OutputExports};
use rolldown_plugin::__inner::SharedPluginable;

use bindle_config::{Format, Platform};

use crate::error::{BuildError, Result};

/// One entry point handed to the engine.
#[derive(Debug, Clone)]
pub struct InputEntry {
    pub name: String,
    pub import: String,
}

/// A fully declarative build invocation: the narrow contract between the
/// orchestrator and the bundler engine.
#[derive(Clone, Default)]
pub struct EngineRequest {
    pub cwd: PathBuf,
    pub input: Vec<InputEntry>,
    pub format: Option<Format>,
    pub platform: Option<Platform>,
    /// Regex sources; a matching import specifier is left external.
    pub external_patterns: Vec<String>,
    /// Compile-time replacements (`process.env.X` and friends).
    pub defines: Vec<(String, String)>,
    /// Syntax-lowering targets (`es2020`, `node18.0.0`, ...).
    pub transform_target: Option<Vec<String>>,
    /// Extension (without dot) to module-type mapping.
    pub module_types: BTreeMap<String, String>,
    /// Import alias to replacement mapping.
    pub alias: BTreeMap<String, String>,
    pub treeshake: bool,
    pub sourcemap: bool,
    pub minify: bool,
    /// Global variable name for iife/umd output.
    pub global_name: Option<String>,
    /// Template for entry chunk filenames, e.g. `[name].mjs`.
    pub entry_filenames: Option<String>,
    /// Template for shared chunk filenames, e.g. `[name]-[hash].js`.
    pub chunk_filenames: Option<String>,
    /// Emit one file per module instead of bundling.
    pub preserve_modules: bool,
    /// Strip this prefix from preserved module paths, keeping output
    /// shallow. Only meaningful with `preserve_modules`.
    pub preserve_modules_root: Option<PathBuf>,
    /// CommonJS exports interop: auto-detect a default export when true,
    /// strictly named exports otherwise. Ignored for other formats.
    pub cjs_default: bool,
    /// Interop shims for the target platform were requested.
    pub shims: bool,
    pub plugins: Vec<SharedPluginable>,
}

impl std::fmt::Debug for EngineRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRequest")
            .field("cwd", &self.cwd)
            .field("input", &self.input)
            .field("format", &self.format)
            .field("platform", &self.platform)
            .field("external_patterns", &self.external_patterns)
            .field("plugins", &self.plugins.len())
            .finish_non_exhaustive()
    }
}

/// What kind of artifact a file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Chunk,
    Asset,
}

/// One emitted build artifact.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub filename: String,
    pub source: Vec<u8>,
    pub kind: OutputKind,
}

impl OutputFile {
    pub fn size(&self) -> usize {
        self.source.len()
    }
}

/// Ordered list of artifacts from one engine invocation.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub files: Vec<OutputFile>,
}

/// The opaque build function.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn build(&self, request: EngineRequest) -> Result<EngineOutput>;
}

/// Production engine backed by rolldown.
#[derive(Debug, Default)]
pub struct RolldownEngine;

impl RolldownEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Engine for RolldownEngine {
    async fn build(&self, request: EngineRequest) -> Result<EngineOutput> {
        let plugins = request.plugins.clone();
        let options = configure_bundler_options(&request);

        let mut bundler: Bundler = BundlerBuilder::default()
            .with_options(options)
            .with_plugins(plugins)
            .build()
            .map_err(|err| BuildError::Engine(format!("{err:?}")))?;

        let bundle = bundler
            .generate()
            .await
            .map_err(|err| BuildError::Engine(format!("{err:?}")))?;

        let files = bundle
            .assets
            .iter()
            .map(|output| match output {
                Output::Chunk(chunk) => OutputFile {
                    filename: chunk.filename.to_string(),
                    source: chunk.code.as_bytes().to_vec(),
                    kind: OutputKind::Chunk,
                },
                Output::Asset(asset) => OutputFile {
                    filename: asset.filename.to_string(),
                    source: asset.source.as_bytes().to_vec(),
                    kind: OutputKind::Asset,
                },
            })
            .collect();

        Ok(EngineOutput { files })
    }
}

fn configure_bundler_options(request: &EngineRequest) -> BundlerOptions {
    let mut options = BundlerOptions {
        format: request.format.map(convert_format),
        platform: request.platform.map(convert_platform),
        ..Default::default()
    };

    options.input = Some(
        request
            .input
            .iter()
            .map(|entry| InputItem {
                name: Some(entry.name.clone()),
                import: entry.import.clone(),
            })
            .collect(),
    );
    options.cwd = Some(request.cwd.clone());

    if !request.external_patterns.is_empty() {
        options.external = Some(IsExternal::from(request.external_patterns.clone()));
    }

    if request.sourcemap {
        options.sourcemap = Some(rolldown::SourceMapType::File);
    }
    if request.minify {
        options.minify = Some(rolldown::RawMinifyOptions::from(true));
    }
    if let Some(name) = &request.global_name {
        options.name = Some(name.clone());
    }
    if let Some(template) = &request.entry_filenames {
        options.entry_filenames = Some(template.clone().into());
    }
    if let Some(template) = &request.chunk_filenames {
        options.chunk_filenames = Some(template.clone().into());
    }
    if !request.defines.is_empty() {
        options.define = Some(request.defines.iter().cloned().collect());
    }
    if !request.module_types.is_empty() {
        let mut table = rustc_hash::FxHashMap::default();
        for (ext, module_type) in &request.module_types {
            if let Some(module_type) = convert_module_type(module_type) {
                table.insert(ext.clone(), module_type);
            } else {
                tracing::warn!("unknown module type '{module_type}' for extension '{ext}'");
            }
        }
        options.module_types = Some(table);
    }
    if !request.alias.is_empty() {
        options.resolve = Some(ResolveOptions {
            alias: Some(
                request
                    .alias
                    .iter()
                    .map(|(alias, target)| (alias.clone(), vec![Some(target.clone())]))
                    .collect(),
            ),
            ..Default::default()
        });
    }
    if !request.treeshake {
        options.treeshake = false.into();
    }
    if request.preserve_modules {
        options.preserve_modules = Some(true);
        if let Some(root) = &request.preserve_modules_root {
            options.preserve_modules_root = Some(root.to_string_lossy().into_owned());
        }
    }
    if request.format == Some(Format::Cjs) {
        options.exports = Some(if request.cjs_default {
            OutputExports::Auto
        } else {
            OutputExports::Named
        });
    }

    options
}

fn convert_format(format: Format) -> rolldown::OutputFormat {
    match format {
        Format::Es => rolldown::OutputFormat::Esm,
        Format::Cjs => rolldown::OutputFormat::Cjs,
        Format::Iife => rolldown::OutputFormat::Iife,
        Format::Umd => rolldown::OutputFormat::Umd,
    }
}

fn convert_platform(platform: Platform) -> rolldown::Platform {
    match platform {
        Platform::Node => rolldown::Platform::Node,
        Platform::Browser => rolldown::Platform::Browser,
        Platform::Neutral => rolldown::Platform::Neutral,
    }
}

fn convert_module_type(value: &str) -> Option<ModuleType> {
    Some(match value {
        "js" => ModuleType::Js,
        "jsx" => ModuleType::Jsx,
        "ts" => ModuleType::Ts,
        "tsx" => ModuleType::Tsx,
        "json" => ModuleType::Json,
        "text" => ModuleType::Text,
        "base64" => ModuleType::Base64,
        "binary" => ModuleType::Binary,
        "css" => ModuleType::Css,
        "asset" => ModuleType::Asset,
        "empty" => ModuleType::Empty,
        _ => return None,
    })
}
