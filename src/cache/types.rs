use serde::{Deserialize, Serialize};

use crate::docs::{PackageDoc, SymbolDoc};
use crate::frontend::ModuleInfo;

/// Cached documentation: a whole package or a single symbol
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "kind", content = "doc", rename_all = "lowercase")]
pub enum CachePayload {
    Package(PackageDoc),
    Symbol(SymbolDoc),
}

impl CachePayload {
    pub fn as_package(&self) -> Option<&PackageDoc> {
        match self {
            CachePayload::Package(pkg) => Some(pkg),
            CachePayload::Symbol(_) => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&SymbolDoc> {
        match self {
            CachePayload::Symbol(sym) => Some(sym),
            CachePayload::Package(_) => None,
        }
    }
}

/// Provenance recorded alongside a payload
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct CacheMetadata {
    /// Toolchain version that produced the entry, empty for versioned modules
    #[serde(default)]
    pub go_version: String,
    #[serde(default)]
    pub module_version: String,
}

impl CacheMetadata {
    /// Provenance for a freshly built entry.
    ///
    /// `resolved` is the version the load actually used. Remote packages are
    /// pinned by module version whenever one is known.
    pub fn derive(
        module: Option<&ModuleInfo>,
        resolved: &str,
        toolchain_version: &str,
        remote: bool,
    ) -> Self {
        let resolved = resolved.trim();
        let mut meta = Self::default();

        match module.filter(|m| !m.path.is_empty()) {
            None => meta.go_version = toolchain_version.to_string(),
            Some(module) if !module.main => {
                let version = module.version.trim();
                meta.module_version = if version.is_empty() {
                    resolved.to_string()
                } else {
                    version.to_string()
                };
            }
            Some(_) => meta.module_version = resolved.to_string(),
        }

        if remote {
            if meta.module_version.is_empty() {
                meta.module_version = resolved.to_string();
            }
            if !meta.module_version.is_empty() {
                meta.go_version.clear();
            }
        }

        meta
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CacheEntry {
    pub payload: CachePayload,
    #[serde(flatten)]
    pub meta: CacheMetadata,
}

impl CacheEntry {
    pub fn package(doc: PackageDoc, meta: CacheMetadata) -> Self {
        Self {
            payload: CachePayload::Package(doc),
            meta,
        }
    }

    pub fn symbol(doc: SymbolDoc, meta: CacheMetadata) -> Self {
        Self {
            payload: CachePayload::Symbol(doc),
            meta,
        }
    }
}
