//! Workspace expansion: the option normalizer.
//!
//! Takes one root configuration plus CLI overrides and produces the ordered
//! list of per-package normalized configurations, together with every config
//! file that was read (the watch loop registers those for restart).

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::discovery::load_config_file;
use crate::error::{ConfigError, Result};
use crate::glob::{self, GlobOptions};
use crate::options::{MatchPattern, OneOrMany, UserConfig, WorkspaceSpec};

/// Directories never considered during package auto-discovery: dependencies,
/// build output, tests, temp trees.
pub const DEFAULT_EXCLUDE_WORKSPACE: &[&str] = &[
    "**/node_modules/**",
    "**/dist/**",
    "**/{test,tests}/**",
    "**/{tmp,temp}/**",
];

/// A normalized per-target configuration: the merged user config with its
/// working directory pinned.
#[derive(Debug, Clone)]
pub struct NormalizedUserConfig {
    pub config: UserConfig,
    pub cwd: PathBuf,
}

/// Expand one root configuration into its workspace members (or itself when
/// no workspace is declared). Returns the member configs plus any member
/// config files that were read.
pub fn resolve_workspace(
    root_config: &UserConfig,
    overrides: &UserConfig,
    fallback_cwd: &Path,
) -> Result<(Vec<NormalizedUserConfig>, Vec<PathBuf>)> {
    let normalized = root_config.merged_with(overrides);
    let root_cwd = match normalized.cwd.clone() {
        Some(cwd) if cwd.is_absolute() => cwd,
        Some(cwd) => fallback_cwd.join(cwd),
        None => fallback_cwd.to_path_buf(),
    };
    let root_cwd = root_cwd.as_path();

    let Some(workspace) = normalized.workspace.clone() else {
        return Ok((
            vec![NormalizedUserConfig {
                config: normalized,
                cwd: root_cwd.to_path_buf(),
            }],
            Vec::new(),
        ));
    };

    let (include, exclude, member_config) = match workspace {
        WorkspaceSpec::Flag(false) => {
            return Ok((
                vec![NormalizedUserConfig {
                    config: normalized,
                    cwd: root_cwd.to_path_buf(),
                }],
                Vec::new(),
            ));
        }
        WorkspaceSpec::Flag(true) => (None, None, None),
        WorkspaceSpec::Include(include) => (Some(include.into_vec()), None, None),
        WorkspaceSpec::Detailed {
            include,
            exclude,
            config,
        } => (include.map(OneOrMany::into_vec), exclude, config),
    };

    let exclude =
        exclude.unwrap_or_else(|| DEFAULT_EXCLUDE_WORKSPACE.iter().map(|s| s.to_string()).collect());

    let mut packages = discover_packages(root_cwd, include.as_deref(), &exclude)?;
    if packages.is_empty() {
        return Err(ConfigError::NoWorkspacePackages(root_cwd.to_path_buf()));
    }

    if let Some(filter) = overrides.filter.clone().or_else(|| normalized.filter.clone()) {
        let patterns = filter
            .into_vec()
            .into_iter()
            .map(|p| MatchPattern::compile(&p).map(|m| (p, m)))
            .collect::<Result<Vec<_>>>()?;
        packages.retain(|path| {
            let text = path.to_string_lossy();
            patterns.iter().any(|(_, m)| filter_matches(m, &text))
        });
        if packages.is_empty() {
            let names: Vec<String> = patterns.into_iter().map(|(p, _)| p).collect();
            return Err(ConfigError::NoPackagesMatched(names.join(", ")));
        }
    }

    let mut configs = Vec::new();
    let mut files = Vec::new();
    for package_dir in packages {
        debug!("loading workspace config in {}", package_dir.display());
        let (member_configs, file) =
            load_config_file(&package_dir, member_config.as_deref(), false)?;
        if let Some(file) = file {
            files.push(file);
        }
        for member in member_configs {
            // member file wins over the inherited root+CLI merge
            let mut config = normalized.merged_with(&member);
            config.workspace = normalized.workspace.clone();
            config.cwd = Some(package_dir.clone());
            configs.push(NormalizedUserConfig {
                config,
                cwd: package_dir.clone(),
            });
        }
    }

    Ok((configs, files))
}

/// Package filters match on substring (plain strings) or regex
/// (`/pattern/`).
fn filter_matches(pattern: &MatchPattern, path: &str) -> bool {
    match pattern {
        MatchPattern::Literal(literal) => path.contains(literal.as_str()),
        MatchPattern::Regex(regex) => regex.is_match(path),
    }
}

fn discover_packages(
    root_cwd: &Path,
    include: Option<&[String]>,
    exclude: &[String],
) -> Result<Vec<PathBuf>> {
    match include {
        // explicit include globs name package directories
        Some(patterns) => glob::glob(
            &patterns.to_vec(),
            root_cwd,
            &GlobOptions {
                ignore: exclude.to_vec(),
                only_dirs: true,
                ..GlobOptions::default()
            },
        ),
        // auto mode: every manifest below the root except the root's own.
        // Nested packages are not deduplicated; each manifest is a candidate.
        None => {
            let manifests = glob::glob(
                &["**/package.json".to_string()],
                root_cwd,
                &GlobOptions {
                    ignore: exclude.to_vec(),
                    only_files: true,
                    ..GlobOptions::default()
                },
            )?;
            Ok(manifests
                .into_iter()
                .filter(|path| path != &root_cwd.join("package.json"))
                .filter_map(|path| path.parent().map(Path::to_path_buf))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::WorkspaceSpec;
    use std::fs;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn workspace_root() -> tempfile::TempDir {
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
        dir
    }

    #[test]
    fn auto_discovery_excludes_root_manifest() {
        let dir = workspace_root();
        let root = UserConfig {
            workspace: Some(WorkspaceSpec::Flag(true)),
            ..UserConfig::default()
        };
        let (configs, files) =
            resolve_workspace(&root, &UserConfig::default(), dir.path()).unwrap();

        assert_eq!(configs.len(), 2);
        let mut cwds: Vec<_> = configs.iter().map(|c| c.cwd.clone()).collect();
        cwds.sort();
        assert_eq!(
            cwds,
            vec![dir.path().join("packages/bar"), dir.path().join("packages/foo")]
        );
        // only bar has its own config file
        assert_eq!(files, vec![dir.path().join("packages/bar/bindle.toml")]);
    }

    #[test]
    fn member_config_wins_over_inherited() {
        let dir = workspace_root();
        let root = UserConfig {
            workspace: Some(WorkspaceSpec::Flag(true)),
            entry: Some(crate::options::EntrySpec::One("src/index.ts".into())),
            ..UserConfig::default()
        };
        let (configs, _) = resolve_workspace(&root, &UserConfig::default(), dir.path()).unwrap();

        let bar = configs
            .iter()
            .find(|c| c.cwd.ends_with("packages/bar"))
            .unwrap();
        match bar.config.entry.as_ref().unwrap() {
            crate::options::EntrySpec::One(entry) => assert_eq!(entry, "index.ts"),
            other => panic!("unexpected entry {other:?}"),
        }
    }

    #[test]
    fn filter_narrows_members() {
        let dir = workspace_root();
        let root = UserConfig {
            workspace: Some(WorkspaceSpec::Flag(true)),
            ..UserConfig::default()
        };
        let overrides = UserConfig {
            filter: Some(OneOrMany::One("foo".into())),
            ..UserConfig::default()
        };
        let (configs, _) = resolve_workspace(&root, &overrides, dir.path()).unwrap();
        assert_eq!(configs.len(), 1);
        assert!(configs[0].cwd.ends_with("packages/foo"));
    }

    #[test]
    fn filter_matching_nothing_is_fatal() {
        let dir = workspace_root();
        let root = UserConfig {
            workspace: Some(WorkspaceSpec::Flag(true)),
            ..UserConfig::default()
        };
        let overrides = UserConfig {
            filter: Some(OneOrMany::One("nonexistent".into())),
            ..UserConfig::default()
        };
        let err = resolve_workspace(&root, &overrides, dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NoPackagesMatched(_)));
    }

    #[test]
    fn empty_workspace_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("package.json"), r#"{ "name": "root" }"#);
        let root = UserConfig {
            workspace: Some(WorkspaceSpec::Flag(true)),
            ..UserConfig::default()
        };
        let err = resolve_workspace(&root, &UserConfig::default(), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NoWorkspacePackages(_)));
    }

    /// Auto-discovery treats every non-root manifest as a candidate member,
    /// including packages nested inside another member's tree.
    #[test]
    fn nested_packages_are_not_deduplicated() {
        let dir = workspace_root();
        let root = dir.path();
        write(
            &root.join("packages/foo/plugins/inner/package.json"),
            r#"{ "name": "inner" }"#,
        );

        let config = UserConfig {
            workspace: Some(WorkspaceSpec::Flag(true)),
            ..UserConfig::default()
        };
        let (configs, _) = resolve_workspace(&config, &UserConfig::default(), root).unwrap();

        let mut cwds: Vec<_> = configs.iter().map(|c| c.cwd.clone()).collect();
        cwds.sort();
        assert_eq!(
            cwds,
            vec![
                root.join("packages/bar"),
                root.join("packages/foo"),
                root.join("packages/foo/plugins/inner"),
            ]
        );
    }

    #[test]
    fn explicit_include_globs_select_directories() {
        let dir = workspace_root();
        let root = UserConfig {
            workspace: Some(WorkspaceSpec::Include(OneOrMany::One("packages/f*".into()))),
            ..UserConfig::default()
        };
        let (configs, _) = resolve_workspace(&root, &UserConfig::default(), dir.path()).unwrap();
        assert_eq!(configs.len(), 1);
        assert!(configs[0].cwd.ends_with("packages/foo"));
    }
}
