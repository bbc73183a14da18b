//! Dependency manifest parsing
//!
//! Supports npm `package.json` and Cargo `Cargo.toml` (including
//! `[workspace.dependencies]` of a workspace root). Runtime and
//! development dependencies are merged into one list: first-seen order is
//! kept and a development entry overrides the version of a runtime entry
//! with the same name.

use crate::error::ManifestError;

/// Known manifest formats, in lookup order
pub const MANIFEST_FILES: &[(&str, ManifestKind)] = &[
    ("package.json", ManifestKind::Npm),
    ("Cargo.toml", ManifestKind::Cargo),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Npm,
    Cargo,
}

/// A dependency name with its version specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub version: String,
}

/// Parse a manifest body into its merged dependency list.
pub fn parse(kind: ManifestKind, body: &str) -> Result<Vec<Dependency>, ManifestError> {
    match kind {
        ManifestKind::Npm => parse_package_json(body),
        ManifestKind::Cargo => parse_cargo_toml(body),
    }
}

fn parse_package_json(body: &str) -> Result<Vec<Dependency>, ManifestError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let root = value
        .as_object()
        .ok_or_else(|| ManifestError::Shape("package.json is not an object".to_string()))?;

    let mut deps = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        let Some(table) = root.get(section) else {
            continue;
        };
        let table = table
            .as_object()
            .ok_or_else(|| ManifestError::Shape(format!("`{}` is not an object", section)))?;
        for (name, spec) in table {
            let version = match spec {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            merge(&mut deps, name, version);
        }
    }
    Ok(deps)
}

fn parse_cargo_toml(body: &str) -> Result<Vec<Dependency>, ManifestError> {
    let root: toml::Table = toml::from_str(body)?;

    // Virtual workspace roots declare shared versions under [workspace]
    let workspace = root.get("workspace").and_then(|w| w.as_table());
    let sections = [
        ("dependencies", root.get("dependencies")),
        ("dev-dependencies", root.get("dev-dependencies")),
        ("workspace.dependencies", workspace.and_then(|w| w.get("dependencies"))),
    ];

    let mut deps = Vec::new();
    for (section, value) in sections {
        let Some(value) = value else {
            continue;
        };
        let table = value
            .as_table()
            .ok_or_else(|| ManifestError::Shape(format!("`[{}]` is not a table", section)))?;
        for (name, spec) in table {
            let version = match spec {
                toml::Value::String(s) => s.clone(),
                toml::Value::Table(t) => t
                    .get("version")
                    .and_then(|v| v.as_str())
                    .unwrap_or("*")
                    .to_string(),
                other => other.to_string(),
            };
            merge(&mut deps, name, version);
        }
    }
    Ok(deps)
}

fn merge(deps: &mut Vec<Dependency>, name: &str, version: String) {
    match deps.iter_mut().find(|d| d.name == name) {
        Some(existing) => existing.version = version,
        None => deps.push(Dependency {
            name: name.to_string(),
            version,
        }),
    }
}
