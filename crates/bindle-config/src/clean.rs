//! Clean pattern resolution.
//!
//! The deletion itself lives with the build driver; this module only decides
//! which patterns a configuration cleans and rejects the one pattern that is
//! never allowed: the working directory itself. That check runs at
//! resolution time, before any filesystem mutation.

use std::path::Path;

use path_clean::PathClean;

use crate::error::{ConfigError, Result};
use crate::options::CleanSpec;

/// Resolve the `clean` option to an explicit pattern list.
///
/// `true` cleans the output directory, `false` cleans nothing. Any pattern
/// that resolves to exactly `cwd` is a fatal configuration error.
pub fn resolve_clean(spec: Option<&CleanSpec>, out_dir: &Path, cwd: &Path) -> Result<Vec<String>> {
    let patterns = match spec {
        None | Some(CleanSpec::Flag(true)) => vec![out_dir.to_string_lossy().into_owned()],
        Some(CleanSpec::Flag(false)) => Vec::new(),
        Some(CleanSpec::Patterns(patterns)) => patterns.clone(),
    };

    for pattern in &patterns {
        let path = Path::new(pattern);
        let resolved = if path.is_absolute() {
            path.clean()
        } else {
            cwd.join(path).clean()
        };
        if resolved == cwd.clean() {
            return Err(ConfigError::CleanCwd(resolved));
        }
    }

    Ok(patterns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_cleans_out_dir() {
        let patterns = resolve_clean(
            None,
            Path::new("/project/dist"),
            Path::new("/project"),
        )
        .unwrap();
        assert_eq!(patterns, vec!["/project/dist".to_string()]);
    }

    #[test]
    fn disabled_cleans_nothing() {
        let patterns = resolve_clean(
            Some(&CleanSpec::Flag(false)),
            Path::new("/project/dist"),
            Path::new("/project"),
        )
        .unwrap();
        assert!(patterns.is_empty());
    }

    #[test]
    fn cleaning_cwd_is_fatal() {
        let err = resolve_clean(
            Some(&CleanSpec::Patterns(vec![".".into()])),
            Path::new("/project/dist"),
            Path::new("/project"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::CleanCwd(path) if path == PathBuf::from("/project")));
    }

    #[test]
    fn cleaning_cwd_by_absolute_path_is_fatal() {
        let err = resolve_clean(
            Some(&CleanSpec::Patterns(vec!["/project".into()])),
            Path::new("/project/dist"),
            Path::new("/project"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::CleanCwd(_)));
    }

    #[test]
    fn explicit_patterns_pass_through() {
        let patterns = resolve_clean(
            Some(&CleanSpec::Patterns(vec![
                "dist".into(),
                "build".into(),
                "*.log".into(),
            ])),
            Path::new("/project/dist"),
            Path::new("/project"),
        )
        .unwrap();
        assert_eq!(patterns, vec!["dist", "build", "*.log"]);
    }
}
