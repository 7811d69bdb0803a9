//! Target environment resolution.

use semver::Version;

use crate::package::PackageJson;

/// Resolve the transform target list. Explicit targets win; otherwise a
/// `node<version>` target is derived from the manifest's `engines.node`
/// range, if any.
pub fn resolve_target(
    target: Option<Vec<String>>,
    pkg: Option<&PackageJson>,
) -> Option<Vec<String>> {
    if let Some(targets) = target {
        let normalized: Vec<String> = targets
            .into_iter()
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        return if normalized.is_empty() {
            None
        } else {
            Some(normalized)
        };
    }

    let engines = pkg?.engines.as_ref()?;
    let range = engines.get("node")?;
    let version = coerce_version(range)?;
    Some(vec![format!("node{version}")])
}

/// Extract the first version-looking token from a range such as `>=18` or
/// `^20.11.0`, padding missing components with zeros.
fn coerce_version(range: &str) -> Option<Version> {
    let start = range.find(|c: char| c.is_ascii_digit())?;
    let token: String = range[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let mut parts = token.split('.').filter(|p| !p.is_empty());
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

/// True when any `node` target is at or past the versions where CommonJS is
/// discouraged (23.0.0, or 22.12.0 in the 22 line).
pub fn has_modern_node_target(targets: &[String]) -> bool {
    targets.iter().any(|target| {
        let Some(rest) = target.strip_prefix("node") else {
            return false;
        };
        let Some(version) = coerce_version(rest) else {
            return false;
        };
        version >= Version::new(23, 0, 0)
            || (version.major == 22 && version >= Version::new(22, 12, 0))
    })
}
