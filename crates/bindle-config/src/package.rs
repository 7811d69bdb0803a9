//! Package-manifest collaborator.
//!
//! Reads the `package.json` nearest to a build target's working directory.
//! Only the fields the resolver consumes are modeled; the rest of the
//! manifest is carried as raw JSON for the export-map writer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageJson {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub package_type: Option<String>,
    pub main: Option<String>,
    pub module: Option<String>,
    pub types: Option<String>,
    pub typings: Option<String>,
    pub exports: Option<Value>,
    pub dependencies: Option<BTreeMap<String, String>>,
    pub peer_dependencies: Option<BTreeMap<String, String>>,
    pub engines: Option<BTreeMap<String, String>>,
    /// Absolute path of the manifest file, set after loading.
    #[serde(skip)]
    pub path: PathBuf,
}

impl PackageJson {
    /// True when `"type": "module"` is declared.
    pub fn is_module(&self) -> bool {
        self.package_type.as_deref() == Some("module")
    }

    /// Names of runtime and peer dependencies, for externalization.
    pub fn external_dependencies(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for table in [&self.dependencies, &self.peer_dependencies] {
            if let Some(table) = table {
                names.extend(table.keys().cloned());
            }
        }
        names.sort();
        names.dedup();
        names
    }
}

/// Read `<cwd>/package.json` if present.
pub fn read_package_json(cwd: &Path) -> Result<Option<PackageJson>> {
    let path = cwd.join("package.json");
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut manifest: PackageJson =
        serde_json::from_str(&content).map_err(|err| ConfigError::ParseFailed {
            path: path.clone(),
            message: err.to_string(),
        })?;
    manifest.path = path;
    Ok(Some(manifest))
}

/// Whether the manifest's export map declares type declarations.
///
/// Matches `exports.types`, or `exports["."].types` when `exports["."]` is an
/// object. A plain string value for `exports["."]` does not count.
pub fn has_exports_types(pkg: &PackageJson) -> bool {
    let Some(exports) = pkg.exports.as_ref().and_then(Value::as_object) else {
        return false;
    };
    if exports.contains_key("types") {
        return true;
    }
    exports
        .get(".")
        .and_then(Value::as_object)
        .is_some_and(|entry| entry.contains_key("types"))
}

/// Whether declaration emission should default on for this manifest:
/// a legacy `types`/`typings` field or a typed export map.
pub fn wants_declarations(pkg: Option<&PackageJson>) -> bool {
    pkg.is_some_and(|pkg| pkg.types.is_some() || pkg.typings.is_some() || has_exports_types(pkg))
}
