//! Documentation model and extraction
//!
//! [`extract`] turns a front-end [`crate::frontend::LoadedUnit`] into a
//! [`PackageDoc`]; [`index`] builds the per-symbol lookup table from the same
//! unit. [`markdown`] lays a result out for the terminal.

pub mod comment;
pub mod extract;
pub mod index;
pub mod markdown;
pub mod outputs;
pub mod signature;

pub use extract::{requires_type_info, to_pkg_doc};
pub use index::{SymbolIndex, build_symbol_index};
pub use markdown::to_markdown;
pub use outputs::{
    ArgInfo, DocResult, FieldDoc, FuncDoc, MethodDoc, PackageDoc, SymbolDoc, SymbolKind, TypeDoc,
    TypeKind, ValueDoc,
};
