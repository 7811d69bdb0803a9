//! Filesystem glob collaborator.
//!
//! A thin wrapper over `globset` + `walkdir` used by workspace discovery and
//! the clean step. Patterns match against the path relative to `cwd`, with
//! `/`-separated components on every platform. Matched directories are
//! returned as themselves; their contents are not expanded.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::Result;

/// Options for [`glob`].
#[derive(Debug, Clone, Default)]
pub struct GlobOptions {
    /// Ignore patterns, matched the same way as the positive patterns.
    pub ignore: Vec<String>,
    /// Only yield directories.
    pub only_dirs: bool,
    /// Only yield files.
    pub only_files: bool,
    /// A matched directory also yields everything below it (the pattern
    /// `dist` behaves like `dist/**` plus the directory itself).
    pub expand_directories: bool,
}

fn build_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        // `*` must not cross path separators, matching conventional glob
        // engines.
        builder.add(GlobBuilder::new(pattern).literal_separator(true).build()?);
    }
    Ok(builder.build()?)
}

fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let text = rel.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        Some(text.into_owned())
    } else {
        Some(text.replace(std::path::MAIN_SEPARATOR, "/"))
    }
}

/// Match `patterns` below `cwd` and return the absolute matched paths in
/// filesystem enumeration order.
pub fn glob(patterns: &[String], cwd: &Path, options: &GlobOptions) -> Result<Vec<PathBuf>> {
    let set = build_set(patterns)?;
    let ignore = build_set(&options.ignore)?;

    let mut matches = Vec::new();
    let mut expanded: Vec<std::path::PathBuf> = Vec::new();
    let mut walker = WalkDir::new(cwd).follow_links(false).into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            // unreadable subtrees are skipped, not fatal
            Err(_) => continue,
        };
        if entry.path() == cwd {
            continue;
        }
        let Some(key) = relative_key(cwd, entry.path()) else {
            continue;
        };

        if ignore.is_match(&key) {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }

        let inside_expanded = expanded.iter().any(|prefix| entry.path().starts_with(prefix));
        if set.is_match(&key) || inside_expanded {
            let is_dir = entry.file_type().is_dir();
            if !((options.only_dirs && !is_dir) || (options.only_files && is_dir)) {
                matches.push(entry.path().to_path_buf());
            }
            if is_dir && !inside_expanded {
                if options.expand_directories {
                    expanded.push(entry.path().to_path_buf());
                } else {
                    // the directory itself matched; do not expand its contents
                    walker.skip_current_dir();
                }
            }
        }
    }
    Ok(matches)
}

/// True if the string contains glob metacharacters.
pub fn is_glob_pattern(value: &str) -> bool {
    value.contains(['*', '?', '[', '{'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn matches_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("dist/old.js"));
        touch(&root.join("build/out.js"));
        touch(&root.join("app.log"));
        touch(&root.join("src/index.ts"));

        let matches = glob(
            &["dist".into(), "build".into(), "*.log".into()],
            root,
            &GlobOptions::default(),
        )
        .unwrap();

        let mut names: Vec<_> = matches
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["app.log", "build", "dist"]);
    }

    #[test]
    fn matched_directories_are_not_expanded() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("dist/nested/deep.js"));

        let matches = glob(&["dist".into()], root, &GlobOptions::default()).unwrap();
        assert_eq!(matches, vec![root.join("dist")]);
    }

    #[test]
    fn ignore_patterns_prune_subtrees() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("packages/a/package.json"));
        touch(&root.join("node_modules/b/package.json"));

        let matches = glob(
            &["**/package.json".into()],
            root,
            &GlobOptions {
                ignore: vec!["**/node_modules/**".into()],
                only_files: true,
                ..GlobOptions::default()
            },
        )
        .unwrap();
        assert_eq!(matches, vec![root.join("packages/a/package.json")]);
    }

    #[test]
    fn expand_directories_yields_contents_too() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("dist/old.js"));
        touch(&root.join("dist/nested/deep.js"));

        let matches = glob(
            &["dist".into()],
            root,
            &GlobOptions {
                expand_directories: true,
                ..GlobOptions::default()
            },
        )
        .unwrap();

        assert!(matches.contains(&root.join("dist")));
        assert!(matches.contains(&root.join("dist/old.js")));
        assert!(matches.contains(&root.join("dist/nested/deep.js")));
    }

    #[test]
    fn star_does_not_cross_separators() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("app.log"));
        touch(&root.join("sub/other.log"));

        let matches = glob(&["*.log".into()], root, &GlobOptions::default()).unwrap();
        assert_eq!(matches, vec![root.join("app.log")]);
    }
}
