//! Output naming and writing.
//!
//! Filename templates are decided here and handed to the engine, so that
//! import references inside emitted code always match what lands on disk.
//! Writing is atomic: temp files first, then renames, with rollback if any
//! step fails. Each format of one configuration writes a disjoint file set,
//! so concurrent per-format writes into the shared output directory cannot
//! conflict.

use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;

use bindle_config::Format;

use crate::engine::OutputFile;
use crate::error::{BuildError, Result};

/// JavaScript extension for a format, given the manifest's module type.
pub fn js_extension(format: Format, pkg_is_module: bool) -> &'static str {
    match format {
        Format::Es => {
            if pkg_is_module {
                ".js"
            } else {
                ".mjs"
            }
        }
        Format::Cjs => {
            if pkg_is_module {
                ".cjs"
            } else {
                ".js"
            }
        }
        Format::Iife | Format::Umd => ".js",
    }
}

/// Format marker inserted before the extension. Only iife/umd need one, and
/// only when several formats share the output directory (their plain
/// extensions would collide otherwise).
pub fn format_infix(format: Format, multi_format: bool) -> &'static str {
    if !multi_format {
        return "";
    }
    match format {
        Format::Iife => ".iife",
        Format::Umd => ".umd",
        Format::Es | Format::Cjs => "",
    }
}

/// Template for entry chunk filenames, e.g. `[name].iife.js`.
pub fn entry_filename_template(format: Format, pkg_is_module: bool, multi_format: bool) -> String {
    format!(
        "[name]{}{}",
        format_infix(format, multi_format),
        js_extension(format, pkg_is_module)
    )
}

/// Template for shared chunk filenames. `hash` controls whether a content
/// hash is part of the name.
pub fn chunk_filename_template(
    format: Format,
    pkg_is_module: bool,
    multi_format: bool,
    hash: bool,
) -> String {
    let stem = if hash { "[name]-[hash]" } else { "[name]" };
    format!(
        "{stem}{}{}",
        format_infix(format, multi_format),
        js_extension(format, pkg_is_module)
    )
}

/// Declaration extension matching a JavaScript extension.
pub fn dts_extension(js_ext: &str) -> &'static str {
    match js_ext {
        ".mjs" => ".d.mts",
        ".cjs" => ".d.cts",
        _ => ".d.ts",
    }
}

/// The on-disk filename of a named entry for one format.
pub fn entry_filename(
    name: &str,
    format: Format,
    pkg_is_module: bool,
    multi_format: bool,
) -> String {
    entry_filename_template(format, pkg_is_module, multi_format).replace("[name]", name)
}

/// Write emitted files into the output directory, overwriting existing
/// files. Filenames are validated against directory traversal before any
/// byte is written.
pub fn write_files(files: &[OutputFile], out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir).map_err(|err| {
        BuildError::Write(format!(
            "failed to create output directory '{}': {err}",
            out_dir.display()
        ))
    })?;

    let mut operations = Vec::with_capacity(files.len());
    for file in files {
        let target = validate_output_path(out_dir, &file.filename)?;
        operations.push((target, file.source.as_slice()));
    }

    write_files_atomic(&operations)
}

/// Reject filenames that would escape the output directory.
fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains('\0') {
        return Err(BuildError::InvalidOutputPath(
            "filename contains a null byte".to_string(),
        ));
    }

    let full_path = base_dir.join(Path::new(filename).clean()).clean();
    if !full_path.starts_with(base_dir) {
        return Err(BuildError::InvalidOutputPath(format!(
            "'{filename}' escapes the output directory '{}'",
            base_dir.display()
        )));
    }
    Ok(full_path)
}

/// Two-phase write: every file goes to a `.tmp` sibling first, then all
/// temp files are renamed into place. A failure at any point removes the
/// temp files already written.
fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut temp_files = Vec::with_capacity(operations.len());

    for (target, content) in operations {
        if let Some(parent) = target.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                cleanup_temp_files(&temp_files);
                return Err(BuildError::Write(format!(
                    "failed to create directory '{}': {err}",
                    parent.display()
                )));
            }
        }

        // append rather than replace the extension: formats writing
        // concurrently share stems (index.mjs / index.js) and must not
        // collide on temp names
        let temp_path = match target.file_name().and_then(|n| n.to_str()) {
            Some(name) => target.with_file_name(format!("{name}.tmp")),
            None => target.with_extension("tmp"),
        };
        if let Err(err) = fs::write(&temp_path, content) {
            cleanup_temp_files(&temp_files);
            return Err(BuildError::Write(format!(
                "failed to write '{}': {err}",
                temp_path.display()
            )));
        }
        temp_files.push((temp_path, target.clone()));
    }

    for (temp_path, target) in &temp_files {
        if let Err(err) = fs::rename(temp_path, target) {
            cleanup_temp_files(&temp_files);
            return Err(BuildError::Write(format!(
                "failed to rename '{}' to '{}': {err}",
                temp_path.display(),
                target.display()
            )));
        }
    }

    Ok(())
}

fn cleanup_temp_files(temp_files: &[(PathBuf, PathBuf)]) {
    for (temp_path, _) in temp_files {
        if temp_path.exists() {
            if let Err(err) = fs::remove_file(temp_path) {
                tracing::warn!("failed to remove temp file '{}': {err}", temp_path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::OutputKind;

    #[test]
    fn single_format_extensions() {
        assert_eq!(entry_filename("index", Format::Es, false, false), "index.mjs");
        assert_eq!(entry_filename("index", Format::Cjs, false, false), "index.js");
        assert_eq!(entry_filename("index", Format::Es, true, false), "index.js");
        assert_eq!(entry_filename("index", Format::Cjs, true, false), "index.cjs");
        assert_eq!(entry_filename("index", Format::Iife, false, false), "index.js");
    }

    #[test]
    fn multi_format_iife_umd_get_markers() {
        assert_eq!(
            entry_filename("index", Format::Iife, false, true),
            "index.iife.js"
        );
        assert_eq!(
            entry_filename("index", Format::Umd, false, true),
            "index.umd.js"
        );
        // es and cjs stay distinct through extensions alone
        assert_eq!(entry_filename("index", Format::Es, false, true), "index.mjs");
        assert_eq!(entry_filename("index", Format::Cjs, false, true), "index.js");
    }

    #[test]
    fn hash_gates_chunk_template() {
        assert_eq!(
            chunk_filename_template(Format::Es, false, false, true),
            "[name]-[hash].mjs"
        );
        assert_eq!(
            chunk_filename_template(Format::Es, false, false, false),
            "[name].mjs"
        );
    }

    #[test]
    fn dts_extensions_track_js_extensions() {
        assert_eq!(dts_extension(".mjs"), ".d.mts");
        assert_eq!(dts_extension(".cjs"), ".d.cts");
        assert_eq!(dts_extension(".js"), ".d.ts");
    }

    #[test]
    fn writes_files_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            OutputFile {
                filename: "index.mjs".into(),
                source: b"export {}".to_vec(),
                kind: OutputKind::Chunk,
            },
            OutputFile {
                filename: "nested/chunk.mjs".into(),
                source: b"//".to_vec(),
                kind: OutputKind::Chunk,
            },
        ];
        write_files(&files, dir.path()).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("index.mjs")).unwrap(),
            "export {}"
        );
        assert!(dir.path().join("nested/chunk.mjs").is_file());
    }

    #[test]
    fn traversal_filenames_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![OutputFile {
            filename: "../escape.js".into(),
            source: b"".to_vec(),
            kind: OutputKind::Chunk,
        }];
        let err = write_files(&files, dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::InvalidOutputPath(_)));
    }
}
