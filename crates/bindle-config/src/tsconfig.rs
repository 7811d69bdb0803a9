//! TypeScript project file discovery.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::Result;
use crate::options::TsconfigSpec;

/// Walk up from `cwd` looking for `name`.
pub fn find_tsconfig(cwd: &Path, name: &str) -> Option<PathBuf> {
    let mut current = Some(cwd);
    while let Some(dir) = current {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}

/// Resolve the `tsconfig` option to an absolute path, or `None` when
/// disabled or not found. Unset and `true` both fall back to the nearest
/// ancestor `tsconfig.json`; an explicit path may point at the file itself
/// or a directory containing one.
pub fn resolve_tsconfig(spec: Option<&TsconfigSpec>, cwd: &Path) -> Result<Option<PathBuf>> {
    match spec {
        Some(TsconfigSpec::Flag(false)) => Ok(None),
        None => Ok(find_tsconfig(cwd, "tsconfig.json")),
        Some(TsconfigSpec::Flag(true)) => {
            let found = find_tsconfig(cwd, "tsconfig.json");
            if found.is_none() {
                warn!("no tsconfig found in {}", cwd.display());
            }
            Ok(found)
        }
        Some(TsconfigSpec::Path(path)) => {
            let resolved = if path.is_absolute() {
                path.clone()
            } else {
                cwd.join(path)
            };
            if resolved.is_file() {
                return Ok(Some(resolved));
            }
            if resolved.is_dir() {
                let inner = resolved.join("tsconfig.json");
                if inner.is_file() {
                    return Ok(Some(inner));
                }
                warn!("no tsconfig found in {}", resolved.display());
                return Ok(None);
            }
            // treat the value as an alternative filename, e.g. tsconfig.build.json
            let found = path
                .to_str()
                .and_then(|name| find_tsconfig(cwd, name));
            if found.is_none() {
                warn!("tsconfig {} doesn't exist", path.display());
            }
            Ok(found)
        }
    }
}
