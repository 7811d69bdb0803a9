//! Entry point resolution.
//!
//! Turns the user's entry declaration (path, glob, list, or explicit map)
//! into a validated output-name to absolute-source-path mapping.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use path_clean::PathClean;

use crate::error::{ConfigError, Result};
use crate::glob::{self, GlobOptions};
use crate::options::EntrySpec;

/// Resolve entry patterns into a non-empty `name -> source path` map.
/// Every resolved path is validated to exist.
pub fn resolve_entry(
    spec: Option<&EntrySpec>,
    cwd: &Path,
    name: Option<&str>,
) -> Result<BTreeMap<String, PathBuf>> {
    let mut entry = BTreeMap::new();

    match spec {
        None => {}
        Some(EntrySpec::Map(map)) => {
            for (output_name, source) in map {
                let path = absolutize(cwd, Path::new(source));
                ensure_exists(&path)?;
                entry.insert(output_name.clone(), path);
            }
        }
        Some(EntrySpec::One(pattern)) => {
            collect_patterns(std::slice::from_ref(pattern), cwd, &mut entry)?;
        }
        Some(EntrySpec::Many(patterns)) => {
            collect_patterns(patterns, cwd, &mut entry)?;
        }
    }

    if entry.is_empty() {
        return Err(ConfigError::NoEntry(name.map(str::to_string)));
    }
    Ok(entry)
}

fn collect_patterns(
    patterns: &[String],
    cwd: &Path,
    entry: &mut BTreeMap<String, PathBuf>,
) -> Result<()> {
    let mut files = Vec::new();
    let mut globs = Vec::new();
    for pattern in patterns {
        if glob::is_glob_pattern(pattern) {
            globs.push(pattern.clone());
        } else {
            let path = absolutize(cwd, Path::new(pattern));
            ensure_exists(&path)?;
            files.push(path);
        }
    }
    if !globs.is_empty() {
        files.extend(glob::glob(
            &globs,
            cwd,
            &GlobOptions {
                ignore: vec!["**/node_modules/**".into()],
                only_files: true,
                ..GlobOptions::default()
            },
        )?);
    }

    let ancestor = lowest_common_ancestor(&files);
    for file in files {
        let name = entry_name(&file, ancestor.as_deref());
        entry.insert(name, file);
    }
    Ok(())
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.clean()
    } else {
        cwd.join(path).clean()
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigError::EntryNotFound(path.to_path_buf()))
    }
}

/// Output name for an entry file: its path relative to the common ancestor
/// of all entries, with the extension stripped.
fn entry_name(file: &Path, ancestor: Option<&Path>) -> String {
    let relative = ancestor
        .and_then(|base| file.strip_prefix(base).ok())
        .unwrap_or_else(|| Path::new(file.file_name().unwrap_or(file.as_os_str())));
    let mut name = relative.with_extension("");
    if name.as_os_str().is_empty() {
        name = PathBuf::from("index");
    }
    let text = name.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        text.into_owned()
    } else {
        text.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// Deepest directory containing every given file.
pub fn lowest_common_ancestor(files: &[PathBuf]) -> Option<PathBuf> {
    let mut ancestor: Option<Vec<Component<'_>>> = None;
    for file in files {
        let dir = file.parent()?;
        let components: Vec<Component<'_>> = dir.components().collect();
        ancestor = Some(match ancestor {
            None => components,
            Some(current) => current
                .iter()
                .zip(components.iter())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| *a)
                .collect(),
        });
    }
    ancestor.map(|components| components.iter().collect())
}
