//! Stale artifact deletion.
//!
//! `clean_targets` deletes everything the given configurations' clean globs
//! match, except each configuration's own output directory (a destination
//! about to be written must survive). The shared [`CleanTrigger`] memoizes
//! the first cycle's clean across sibling configurations: the first caller
//! runs it, everyone else awaits the same operation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use path_clean::PathClean;
use tokio::sync::OnceCell;
use tokio::task::JoinSet;
use tracing::{debug, info};

use bindle_config::glob::{GlobOptions, glob, is_glob_pattern};
use bindle_config::ResolvedOptions;

use crate::error::{BuildError, Result};

/// Collect and delete every clean match across `configs`.
pub async fn clean_targets(configs: &[Arc<ResolvedOptions>]) -> Result<()> {
    let mut removes: BTreeSet<PathBuf> = BTreeSet::new();

    for config in configs {
        if config.clean.is_empty() {
            continue;
        }
        let out_dir = config.out_dir.clean();
        for path in collect_matches(&config.clean, &config.cwd)? {
            if path.clean() != out_dir {
                removes.insert(path);
            }
        }
    }

    if removes.is_empty() {
        return Ok(());
    }
    info!("cleaning {} paths", removes.len());

    let mut tasks = JoinSet::new();
    for path in removes {
        tasks.spawn(async move {
            debug!("removing {}", path.display());
            remove_path(&path).await
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.map_err(|err| BuildError::Write(format!("clean task failed: {err}")))??;
    }
    Ok(())
}

/// Resolve clean patterns to concrete paths. Absolute patterns without glob
/// metacharacters are taken literally; everything else goes through the
/// glob collaborator relative to `cwd`.
fn collect_matches(patterns: &[String], cwd: &Path) -> Result<Vec<PathBuf>> {
    let mut literal = Vec::new();
    let mut relative = Vec::new();

    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_absolute() {
            if is_glob_pattern(pattern) {
                match path.strip_prefix(cwd) {
                    Ok(rest) => relative.push(rest.to_string_lossy().into_owned()),
                    Err(_) => {
                        tracing::warn!(
                            "ignoring absolute clean glob outside the working directory: {pattern}"
                        );
                    }
                }
            } else if path.exists() {
                literal.push(path.to_path_buf());
                // a plain directory target expands one level, so the
                // own-out-dir exclusion still empties the directory while
                // keeping it in place
                if path.is_dir() {
                    for child in std::fs::read_dir(path)? {
                        literal.push(child?.path());
                    }
                }
            }
        } else {
            relative.push(pattern.clone());
        }
    }

    if !relative.is_empty() {
        // matched directories expand: cleaning `dist` empties its contents,
        // while the own-out-dir exclusion keeps the directory itself
        literal.extend(glob(
            &relative,
            cwd,
            &GlobOptions {
                expand_directories: true,
                ..GlobOptions::default()
            },
        )?);
    }
    Ok(literal)
}

async fn remove_path(path: &Path) -> Result<()> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err.into()),
    };
    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// The deduplicated clean step shared by sibling configurations on their
/// first cycle. First caller wins; repeated calls await the completed (or
/// in-flight) operation.
pub struct CleanTrigger {
    configs: Vec<Arc<ResolvedOptions>>,
    once: OnceCell<()>,
}

impl CleanTrigger {
    pub fn new(configs: Vec<Arc<ResolvedOptions>>) -> Self {
        Self {
            configs,
            once: OnceCell::new(),
        }
    }

    pub async fn run(&self) -> Result<()> {
        self.once
            .get_or_try_init(|| clean_targets(&self.configs))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindle_config::{NormalizedUserConfig, UserConfig, resolve_config};
    use std::fs;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn config_for(root: &Path, clean: Vec<String>) -> Arc<ResolvedOptions> {
        write(&root.join("index.ts"), "export {}");
        let user = UserConfig {
            entry: Some(bindle_config::EntrySpec::One("index.ts".into())),
            clean: Some(bindle_config::CleanSpec::Patterns(clean)),
            ..UserConfig::default()
        };
        Arc::new(
            resolve_config(NormalizedUserConfig {
                config: user,
                cwd: root.to_path_buf(),
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn removes_matches_but_recreates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("dist/old-file.js"), "stale");
        write(&root.join("build/build-file.js"), "stale");
        write(&root.join("app.log"), "log");
        write(&root.join("src/keep.ts"), "kept");

        let config = config_for(root, vec!["dist".into(), "build".into(), "*.log".into()]);
        clean_targets(&[config]).await.unwrap();

        assert!(!root.join("build").exists());
        assert!(!root.join("app.log").exists());
        assert!(root.join("src/keep.ts").exists());
        // `dist` is the out_dir: emptied, never deleted by its own config
        assert!(root.join("dist").exists());
        assert!(!root.join("dist/old-file.js").exists());
    }

    #[tokio::test]
    async fn own_out_dir_is_spared_even_when_matched() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("dist/old.js"), "stale");

        // default clean (true) resolves to the absolute out_dir pattern
        write(&root.join("index.ts"), "export {}");
        let user = UserConfig {
            entry: Some(bindle_config::EntrySpec::One("index.ts".into())),
            ..UserConfig::default()
        };
        let config = Arc::new(
            resolve_config(NormalizedUserConfig {
                config: user,
                cwd: root.to_path_buf(),
            })
            .unwrap(),
        );

        clean_targets(&[config]).await.unwrap();
        assert!(root.join("dist").exists());
        assert!(!root.join("dist/old.js").exists());
    }

    #[tokio::test]
    async fn trigger_runs_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("build/stale.js"), "stale");

        let config = config_for(root, vec!["build".into()]);
        let trigger = CleanTrigger::new(vec![config]);

        trigger.run().await.unwrap();
        assert!(!root.join("build").exists());

        // recreate; a second run must be a no-op because the clean is memoized
        write(&root.join("build/stale.js"), "stale");
        trigger.run().await.unwrap();
        assert!(root.join("build/stale.js").exists());
    }
}
