//! Error types for documentation loading
//!
//! Input and resolution failures abort a load. Persistence failures surface
//! through [`CacheError`] after the in-memory cache has already been updated.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors returned by [`crate::Godoc::load`]
#[derive(Debug, Error)]
pub enum GodocError {
    #[error("import path cannot be empty")]
    EmptyImportPath,

    #[error("invalid import path: {0}")]
    InvalidImportPath(&'static str),

    #[error("invalid selector format: {0:?}")]
    InvalidSelector(String),

    #[error("local load failed ({local:#}) and module dependency setup failed ({setup:#})")]
    Resolution {
        local: anyhow::Error,
        setup: anyhow::Error,
    },

    #[error("load with module dependency failed: {0:#}")]
    SandboxLoad(anyhow::Error),

    #[error("symbol {symbol:?} not found in {import_path:?}")]
    SymbolNotFound { symbol: String, import_path: String },

    #[error("failed to query go toolchain: {0}")]
    Toolchain(#[source] CommandError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("operation cancelled: {0}")]
    Cancelled(String),

    #[error("operation timed out after {0:?}")]
    TimedOut(Duration),
}

impl GodocError {
    /// Whether the request itself was malformed (never worth retrying)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyImportPath | Self::InvalidImportPath(_) | Self::InvalidSelector(_)
        )
    }

    /// Whether the load was aborted by cancellation or timeout
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_) | Self::TimedOut(_))
    }

    /// Whether the failure was a permission error while persisting the cache
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Cache(err) if err.is_permission_denied())
    }
}

/// Errors from the documentation cache
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("could not determine user cache directory")]
    NoCacheDir,

    #[error("could not create cache directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read cache snapshot {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt cache snapshot {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode cache snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write cache snapshot {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CacheError {
    /// Whether the underlying I/O failure was a permission error
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::CreateDir { source, .. }
            | Self::Read { source, .. }
            | Self::Persist { source, .. } => source.kind() == io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }

    /// Whether the snapshot file simply does not exist yet
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Errors from running external commands
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{command} failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{command}: cancelled")]
    Cancelled { command: String },
}

impl CommandError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
