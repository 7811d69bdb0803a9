//! Declaration file emission.
//!
//! Generates `.d.ts` output from TypeScript entry modules using OXC's
//! isolated declarations, hooked in after the engine finishes a bundle.
//! The CommonJS format cannot share a pass with its declarations (the
//! generated wrapper demands ESM-style emission), so the driver issues a
//! second, declaration-only invocation with `emit_dts_only` set: that pass
//! keeps the declaration assets and discards the JavaScript chunks.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_isolated_declarations::{IsolatedDeclarations, IsolatedDeclarationsOptions};
use oxc_parser::Parser;
use oxc_span::SourceType as OxcSourceType;
use rolldown_common::{Output, OutputAsset};
use rolldown_plugin::{HookGenerateBundleArgs, HookNoopReturn, HookUsage, Plugin, PluginContext};

/// Configuration for [`DtsPlugin`].
#[derive(Debug, Clone)]
pub struct DtsPluginOptions {
    /// Drop declarations tagged `@internal`.
    pub strip_internal: bool,
    /// Extension for emitted declarations (`.d.ts`, `.d.mts`, `.d.cts`).
    pub extension: String,
    /// Subdirectory for declarations, relative to the output directory.
    pub dir: Option<PathBuf>,
    /// Keep only declaration assets, dropping the JavaScript chunks.
    pub emit_dts_only: bool,
}

/// Emits one declaration file per chunk whose facade module is TypeScript.
#[derive(Debug)]
pub struct DtsPlugin {
    options: DtsPluginOptions,
}

impl DtsPlugin {
    pub fn new(options: DtsPluginOptions) -> Self {
        Self { options }
    }
}

impl Plugin for DtsPlugin {
    fn name(&self) -> Cow<'static, str> {
        "bindle:dts".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::GenerateBundle
    }

    fn generate_bundle(
        &self,
        _ctx: &PluginContext,
        args: &mut HookGenerateBundleArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        let options = self.options.clone();

        async move {
            let mut dts_assets = Vec::new();

            for output in args.bundle.iter() {
                let Output::Chunk(chunk) = output else {
                    continue;
                };
                // chunk modules are ordered dependency-first; the facade
                // entry module comes last
                let Some(module_id) = chunk
                    .modules
                    .keys
                    .iter()
                    .rev()
                    .find(|id| is_typescript_module(id.as_ref()))
                else {
                    continue;
                };

                let source = match std::fs::read_to_string(module_id.as_ref()) {
                    Ok(source) => source,
                    Err(err) => {
                        tracing::warn!(
                            "skipping declarations for {}: {err}",
                            module_id.as_ref()
                        );
                        continue;
                    }
                };

                let content = match generate_dts(&source, module_id.as_ref(), options.strip_internal)
                {
                    Ok(content) => content,
                    Err(message) => {
                        tracing::warn!(
                            "failed to generate declarations for {}: {message}",
                            module_id.as_ref()
                        );
                        continue;
                    }
                };

                let filename =
                    declaration_filename(&chunk.filename, &options.extension, options.dir.as_deref());
                dts_assets.push(Output::Asset(Arc::new(OutputAsset {
                    names: vec![],
                    original_file_names: vec![module_id.to_string()],
                    filename: filename.into(),
                    source: content.into(),
                })));
            }

            if options.emit_dts_only {
                args.bundle.clear();
            }
            args.bundle.extend(dts_assets);

            Ok(())
        }
    }
}

fn is_typescript_module(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext, "ts" | "tsx" | "mts" | "cts"))
        .unwrap_or(false)
}

/// Declaration filename for a chunk: the chunk's stem plus the declaration
/// extension, optionally under a subdirectory.
fn declaration_filename(chunk_filename: &str, extension: &str, dir: Option<&Path>) -> String {
    let stem = Path::new(chunk_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("index");
    let filename = format!("{stem}{extension}");
    match dir {
        Some(dir) => format!("{}/{filename}", dir.display()),
        None => filename,
    }
}

fn generate_dts(source: &str, file_path: &str, strip_internal: bool) -> Result<String, String> {
    let allocator = Allocator::default();

    let source_type = OxcSourceType::from_path(file_path)
        .map_err(|_| format!("not a TypeScript file: {file_path}"))?;

    let parse_result = Parser::new(&allocator, source, source_type).parse();
    if !parse_result.errors.is_empty() {
        let messages: Vec<String> = parse_result
            .errors
            .iter()
            .map(|e| format!("{e:?}"))
            .collect();
        return Err(messages.join(", "));
    }

    let isolated = IsolatedDeclarations::new(
        &allocator,
        IsolatedDeclarationsOptions { strip_internal },
    );
    let result = isolated.build(&parse_result.program);
    if !result.errors.is_empty() {
        let messages: Vec<String> = result.errors.iter().map(|e| format!("{e:?}")).collect();
        return Err(messages.join(", "));
    }

    Ok(Codegen::new().build(&result.program).code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typescript_modules_are_detected() {
        assert!(is_typescript_module("src/index.ts"));
        assert!(is_typescript_module("component.tsx"));
        assert!(is_typescript_module("mod.mts"));
        assert!(!is_typescript_module("index.js"));
        assert!(!is_typescript_module("style.css"));
    }

    #[test]
    fn declaration_filenames_follow_chunk_stems() {
        assert_eq!(declaration_filename("index.mjs", ".d.mts", None), "index.d.mts");
        assert_eq!(declaration_filename("index.js", ".d.cts", None), "index.d.cts");
        assert_eq!(
            declaration_filename("index.js", ".d.ts", Some(Path::new("types"))),
            "types/index.d.ts"
        );
    }

    #[test]
    fn generates_declarations_for_exported_function() {
        let source = "export function greet(name: string): string { return name }";
        let dts = generate_dts(source, "test.ts", false).unwrap();
        assert!(dts.contains("export"));
        assert!(dts.contains("greet"));
        assert!(dts.contains("string"));
    }

    #[test]
    fn strip_internal_drops_tagged_declarations() {
        let source = "/** @internal */\nexport function hidden(): void {}\nexport function shown(): void {}";
        let dts = generate_dts(source, "test.ts", true).unwrap();
        assert!(!dts.contains("hidden"));
        assert!(dts.contains("shown"));
    }
}
