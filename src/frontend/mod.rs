//! Language front-end boundary
//!
//! Parsing and type checking happen outside this crate. A [`FrontEnd`] turns
//! an import path resolved in some directory into a [`LoadedUnit`].

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

pub mod command;
pub mod syntax;

pub use command::CommandFrontEnd;
pub use syntax::{PackageSyntax, TypeInfo};

/// How much the front-end should compute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Syntax and doc comments only
    Syntax,
    /// Syntax plus type-checked signatures
    Full,
}

/// A request to load one package
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub dir: PathBuf,
    pub import_path: String,
    pub mode: LoadMode,
    /// Extra environment the toolchain expects (`GOOS`, `GOARCH`, ...)
    pub env: Vec<(String, String)>,
    pub cancel: CancellationToken,
}

impl LoadRequest {
    pub fn with_mode(&self, mode: LoadMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }
}

/// Module the loaded package belongs to
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct ModuleInfo {
    pub path: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub main: bool,
}

/// Result of a front-end load
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LoadedUnit {
    /// Canonical import path of the package
    pub pkg_path: String,
    pub package: PackageSyntax,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<TypeInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleInfo>,
}

pub trait FrontEnd: Send + Sync {
    fn load(
        &self,
        request: &LoadRequest,
    ) -> impl Future<Output = anyhow::Result<LoadedUnit>> + Send;
}

impl<F: FrontEnd> FrontEnd for Arc<F> {
    fn load(
        &self,
        request: &LoadRequest,
    ) -> impl Future<Output = anyhow::Result<LoadedUnit>> + Send {
        (**self).load(request)
    }
}
