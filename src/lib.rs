//! Go package documentation loader.
//!
//! [`Godoc`] resolves an import path against the local project, the Go
//! source tree or a throwaway module sandbox, extracts package and symbol
//! documentation through a language front-end, and caches the results on
//! disk keyed by import path, version and symbol.

pub mod cache;
pub mod docs;
pub mod error;
pub mod frontend;
pub mod resolver;
pub mod service;

pub use cache::{CacheConfig, DocCache};
pub use docs::{DocResult, PackageDoc, SymbolDoc};
pub use error::{CacheError, GodocError};
pub use service::{CacheSource, DocRequest, Godoc, GodocOptions, validate_inputs};
