//! Config file discovery and loading.
//!
//! Searches for a `bindle.toml` first, then a `package.json` with a
//! `"bindle"` field. A file may declare a single target or several: in TOML
//! the repeated `[[target]]` table form, in JSON either an object or an
//! array.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{ConfigError, Result};
use crate::options::UserConfig;

pub const CONFIG_FILE: &str = "bindle.toml";

/// Find a config file in `dir`, if any.
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    let toml_path = dir.join(CONFIG_FILE);
    if toml_path.is_file() {
        return Some(toml_path);
    }

    let pkg_path = dir.join("package.json");
    if pkg_path.is_file() {
        if let Ok(content) = std::fs::read_to_string(&pkg_path) {
            if let Ok(parsed) = serde_json::from_str::<Value>(&content) {
                if parsed.get("bindle").is_some_and(|v| !v.is_null()) {
                    return Some(pkg_path);
                }
            }
        }
    }

    None
}

/// True when a changed path is (or names) a config file that requires a
/// full restart rather than an incremental rebuild.
pub fn is_config_file_name(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some(CONFIG_FILE) | Some("package.json")
    )
}

/// Load the config file for `dir`.
///
/// `explicit` forces a specific file; `disabled` skips file loading
/// entirely. Returns the target list (possibly empty when no file exists)
/// plus the file that was read, for watch registration.
pub fn load_config_file(
    dir: &Path,
    explicit: Option<&Path>,
    disabled: bool,
) -> Result<(Vec<UserConfig>, Option<PathBuf>)> {
    if disabled {
        return Ok((vec![UserConfig::default()], None));
    }

    let path = match explicit {
        Some(path) => {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                dir.join(path)
            };
            if !path.is_file() {
                return Err(ConfigError::InvalidValue {
                    field: "config",
                    message: format!("config file {} does not exist", path.display()),
                });
            }
            path
        }
        None => match find_config_file(dir) {
            Some(path) => path,
            None => return Ok((vec![UserConfig::default()], None)),
        },
    };

    let configs = parse_config_file(&path)?;
    Ok((configs, Some(path)))
}

fn parse_config_file(path: &Path) -> Result<Vec<UserConfig>> {
    let content = std::fs::read_to_string(path)?;

    let value: Value = if path.file_name().and_then(|n| n.to_str()) == Some("package.json") {
        let manifest: Value =
            serde_json::from_str(&content).map_err(|err| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        manifest
            .get("bindle")
            .cloned()
            .ok_or_else(|| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                message: "package.json has no \"bindle\" field".to_string(),
            })?
    } else {
        let table: toml::Value =
            toml::from_str(&content).map_err(|err| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        serde_json::to_value(table).map_err(|err| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?
    };

    split_targets(path, value)
}

/// One config value may describe several independent targets.
fn split_targets(path: &Path, value: Value) -> Result<Vec<UserConfig>> {
    let deserialize = |value: Value| -> Result<UserConfig> {
        serde_json::from_value(value).map_err(|err| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    };

    match value {
        Value::Array(items) => items.into_iter().map(deserialize).collect(),
        Value::Object(mut table) => {
            if let Some(Value::Array(targets)) = table.remove("target") {
                if !table.is_empty() {
                    return Err(ConfigError::ParseFailed {
                        path: path.to_path_buf(),
                        message: "top-level fields cannot be combined with [[target]] tables"
                            .to_string(),
                    });
                }
                targets.into_iter().map(deserialize).collect()
            } else {
                Ok(vec![deserialize(Value::Object(table))?])
            }
        }
        other => Err(ConfigError::ParseFailed {
            path: path.to_path_buf(),
            message: format!("expected a table or array of tables, got {other}"),
        }),
    }
}
