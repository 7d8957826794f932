//! Module catalog loading.
//!
//! The catalog is a `{ "modules": [...] }` document, JSON by default or YAML
//! when the file extension is `.yaml`/`.yml`. Entries are decoded one by one:
//! an entry with an unknown `type` or missing locator fields is skipped with a
//! warning rather than failing the whole catalog. A document that cannot be
//! parsed at all, or that repeats a module name, is an error.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{io_err, CatalogError};
use crate::types::{ModuleDescriptor, ModuleName};

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    modules: Vec<serde_json::Value>,
}

/// A catalog entry that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Position in the `modules` list.
    pub index: usize,
    /// The entry's `name`, if it had one.
    pub name: Option<String>,
    pub reason: String,
}

/// The decoded module catalog. Immutable for the duration of a run.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    modules: Vec<ModuleDescriptor>,
    skipped: Vec<SkippedEntry>,
}

impl Catalog {
    /// Build a catalog from already-decoded descriptors.
    ///
    /// Returns [`CatalogError::DuplicateModule`] if two descriptors share a name.
    pub fn from_modules(modules: Vec<ModuleDescriptor>) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        for m in &modules {
            if !seen.insert(m.name.clone()) {
                return Err(CatalogError::DuplicateModule {
                    name: m.name.0.clone(),
                });
            }
        }
        Ok(Self {
            modules,
            skipped: Vec::new(),
        })
    }

    /// All decoded descriptors in catalog order.
    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    /// Entries dropped during decoding.
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    /// Enabled modules sorted by name.
    pub fn enabled(&self) -> Vec<&ModuleDescriptor> {
        let mut enabled: Vec<_> = self.modules.iter().filter(|m| m.enabled).collect();
        enabled.sort_by(|a, b| a.name.cmp(&b.name));
        enabled
    }

    pub fn get(&self, name: &ModuleName) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|m| &m.name == name)
    }

    /// Description used in captions, if the catalog knows the module.
    pub fn description(&self, name: &ModuleName) -> Option<&str> {
        self.get(name)
            .and_then(|m| m.description.as_deref())
            .filter(|d| !d.trim().is_empty())
    }
}

/// Load the catalog at `path`.
pub fn load_at(path: &Path) -> Result<Catalog, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::CatalogNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let raw = parse_raw(path, &contents)?;

    let mut modules = Vec::new();
    let mut skipped = Vec::new();
    for (index, value) in raw.modules.into_iter().enumerate() {
        let name = value
            .get("name")
            .and_then(|n| n.as_str())
            .map(str::to_owned);
        match serde_json::from_value::<ModuleDescriptor>(value) {
            Ok(module) => modules.push(module),
            Err(e) => {
                tracing::warn!(
                    index,
                    module = name.as_deref().unwrap_or("<unnamed>"),
                    error = %e,
                    "skipping unsupported catalog entry"
                );
                skipped.push(SkippedEntry {
                    index,
                    name,
                    reason: e.to_string(),
                });
            }
        }
    }

    let mut catalog = Catalog::from_modules(modules)?;
    catalog.skipped = skipped;
    Ok(catalog)
}

fn parse_raw(path: &Path, contents: &str) -> Result<RawCatalog, CatalogError> {
    if is_yaml(path) {
        serde_yaml::from_str(contents).map_err(|e| CatalogError::ParseYaml {
            path: PathBuf::from(path),
            source: e,
        })
    } else {
        serde_json::from_str(contents).map_err(|e| CatalogError::Parse {
            path: PathBuf::from(path),
            source: e,
        })
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
