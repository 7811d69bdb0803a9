//! Package export-map updates.
//!
//! After a successful build, rewrite the target's `package.json` so its
//! entry fields point at the freshly emitted files: the `"."` export map,
//! and optionally the legacy `main`/`module`/`types` fields.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value, json};

use bindle_config::{Format, ResolvedOptions};

use crate::driver::BuildChunks;
use crate::engine::OutputKind;
use crate::error::{BuildError, Result};
use crate::output::{dts_extension, entry_filename, js_extension};

/// Write export-map updates for one configuration, if enabled. Never rolls
/// anything back: emitted files stay on disk whatever happens here.
pub async fn write_exports(options: &ResolvedOptions, chunks: &BuildChunks) -> Result<()> {
    let Some(exports_config) = &options.exports else {
        return Ok(());
    };
    let Some(pkg) = &options.pkg else {
        tracing::warn!("exports generation is enabled but no package.json was found");
        return Ok(());
    };

    let pkg_dir = pkg
        .path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let paths = resolved_entry_paths(options, chunks, &pkg_dir);
    if paths.is_empty() {
        return Ok(());
    }

    let content = tokio::fs::read_to_string(&pkg.path).await?;
    let mut manifest: Value =
        serde_json::from_str(&content).map_err(|err| BuildError::Write(err.to_string()))?;
    let Some(table) = manifest.as_object_mut() else {
        return Err(BuildError::Write(format!(
            "{} is not a JSON object",
            pkg.path.display()
        )));
    };

    let mut dot = Map::new();
    if let Some(types) = paths.get("types") {
        dot.insert("types".to_string(), json!(types));
    }
    if let Some(import) = paths.get("import") {
        dot.insert("import".to_string(), json!(import));
    }
    if let Some(require) = paths.get("require") {
        dot.insert("require".to_string(), json!(require));
    }

    let export_value = if dot.len() == 1 && paths.contains_key("import") {
        json!(paths["import"])
    } else {
        Value::Object(dot)
    };

    let field = if exports_config.dev_exports {
        "devExports"
    } else {
        "exports"
    };
    let mut exports_map = Map::new();
    exports_map.insert(".".to_string(), export_value);
    table.insert(field.to_string(), Value::Object(exports_map));

    if exports_config.legacy {
        if let Some(main) = paths.get("require").or_else(|| paths.get("import")) {
            table.insert("main".to_string(), json!(main));
        }
        if let Some(module) = paths.get("import") {
            table.insert("module".to_string(), json!(module));
        }
        if let Some(types) = paths.get("types") {
            table.insert("types".to_string(), json!(types));
        }
    }

    let mut serialized =
        serde_json::to_string_pretty(&manifest).map_err(|err| BuildError::Write(err.to_string()))?;
    serialized.push('\n');
    tokio::fs::write(&pkg.path, serialized).await?;
    tracing::debug!("updated {field} in {}", pkg.path.display());
    Ok(())
}

/// Map export conditions to package-relative paths of the main entry.
fn resolved_entry_paths(
    options: &ResolvedOptions,
    chunks: &BuildChunks,
    pkg_dir: &Path,
) -> BTreeMap<&'static str, String> {
    let pkg_is_module = options.pkg.as_ref().is_some_and(|pkg| pkg.is_module());
    let multi_format = options.format.len() > 1;
    let entry_name = main_entry_name(options);

    let mut paths = BTreeMap::new();
    for format in &options.format {
        let condition = match format {
            Format::Es => "import",
            Format::Cjs => "require",
            Format::Iife | Format::Umd => continue,
        };
        let filename = entry_filename(&entry_name, *format, pkg_is_module, multi_format);
        let emitted = chunks
            .get(format)
            .is_some_and(|files| files.iter().any(|file| file.filename == filename));
        if !emitted {
            continue;
        }
        paths.insert(condition, relative_export_path(pkg_dir, options, &filename));

        if options.dts.is_some() && !paths.contains_key("types") {
            let declaration = format!(
                "{entry_name}{}",
                dts_extension(js_extension(*format, pkg_is_module))
            );
            let has_declaration = chunks.get(format).is_some_and(|files| {
                files
                    .iter()
                    .any(|file| file.kind == OutputKind::Asset && file.filename == declaration)
            });
            if has_declaration {
                paths.insert("types", relative_export_path(pkg_dir, options, &declaration));
            }
        }
    }
    paths
}

/// The entry used for the `"."` export: `index` when present, otherwise the
/// single entry's name.
fn main_entry_name(options: &ResolvedOptions) -> String {
    if options.entry.contains_key("index") {
        "index".to_string()
    } else if options.entry.len() == 1 {
        options
            .entry
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(|| "index".to_string())
    } else {
        "index".to_string()
    }
}

fn relative_export_path(pkg_dir: &Path, options: &ResolvedOptions, filename: &str) -> String {
    let absolute = options.out_dir.join(filename);
    let relative = absolute
        .strip_prefix(pkg_dir)
        .map(|p| p.to_path_buf())
        .unwrap_or(absolute);
    let text = relative.to_string_lossy().replace('\\', "/");
    format!("./{text}")
}
