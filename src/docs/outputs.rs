//! Output types for extracted documentation
//!
//! These are the values handed back from [`crate::Godoc::load`] and stored in
//! the cache snapshot. Rendered HTML is derived state: it is never serialized
//! and never takes part in equality.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::comment::{LazyHtml, PACKAGE_HEADING_LEVEL, SYMBOL_HEADING_LEVEL};

/// A single parameter or result of a function
#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Clone, Default)]
pub struct ArgInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl ArgInfo {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A const or var group
#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Clone, Default)]
pub struct ValueDoc {
    pub names: Vec<String>,
    pub doc: String,
}

impl ValueDoc {
    /// Key used to order value groups
    pub fn sort_key(&self) -> String {
        self.names.join(",")
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Clone, Default)]
pub struct FuncDoc {
    pub name: String,
    pub args: Vec<ArgInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub returns: Vec<ArgInfo>,
    pub doc: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Clone, Default)]
pub struct MethodDoc {
    /// Receiver display name (`Buffer` for `*bytes.Buffer`)
    pub recv: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub recv_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub recv_type: String,
    pub name: String,
    pub args: Vec<ArgInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub returns: Vec<ArgInfo>,
    pub doc: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Clone, Default)]
pub struct FieldDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub doc: String,
    /// Raw struct tag without the surrounding backticks
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub embedded: bool,
}

/// Category of a type declaration
#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Struct,
    Interface,
    Alias,
    #[default]
    Other,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Struct => "struct",
            TypeKind::Interface => "interface",
            TypeKind::Alias => "alias",
            TypeKind::Other => "other",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Clone, Default)]
pub struct TypeDoc {
    pub name: String,
    pub doc: String,
    /// Source-like rendering of the declaration
    pub decl: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub fields: Vec<FieldDoc>,
    #[serde(default)]
    pub methods: Vec<MethodDoc>,
}

/// Documentation for a whole package
#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq, Clone, Default)]
pub struct PackageDoc {
    pub import_path: String,
    pub name: String,
    pub synopsis: String,
    pub doc: String,
    #[serde(skip)]
    #[schemars(skip)]
    pub(crate) html: LazyHtml,
    #[serde(default)]
    pub consts: Vec<ValueDoc>,
    #[serde(default)]
    pub vars: Vec<ValueDoc>,
    #[serde(default)]
    pub funcs: Vec<FuncDoc>,
    #[serde(default)]
    pub types: Vec<TypeDoc>,
}

impl PackageDoc {
    pub fn text(&self) -> &str {
        &self.doc
    }

    /// Package doc rendered as HTML with top-level headings at `<h2>`
    pub fn html(&self) -> &str {
        self.html.get_or_render(&self.doc, PACKAGE_HEADING_LEVEL)
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeDoc> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn find_func(&self, name: &str) -> Option<&FuncDoc> {
        self.funcs.iter().find(|f| f.name == name)
    }

    /// Sorts every collection into its canonical order. Idempotent.
    pub fn sort(&mut self) {
        self.consts.sort_by_cached_key(ValueDoc::sort_key);
        self.vars.sort_by_cached_key(ValueDoc::sort_key);
        self.funcs.sort_by(|a, b| a.name.cmp(&b.name));
        self.types.sort_by(|a, b| a.name.cmp(&b.name));
        for ty in &mut self.types {
            ty.methods.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }
}

/// What a [`SymbolDoc`] describes
#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Func,
    Method,
    Type,
    Const,
    Var,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Func => "func",
            SymbolKind::Method => "method",
            SymbolKind::Type => "type",
            SymbolKind::Const => "const",
            SymbolKind::Var => "var",
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Func | SymbolKind::Method)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Documentation for a single symbol within a package
#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq, Clone)]
pub struct SymbolDoc {
    pub import_path: String,
    pub package: String,
    pub kind: SymbolKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub receiver: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub receiver_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub receiver_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<ArgInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<Vec<ArgInfo>>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_doc: Option<TypeDoc>,
    pub doc: String,
    #[serde(skip)]
    #[schemars(skip)]
    pub(crate) html: LazyHtml,
}

impl SymbolDoc {
    /// Creates a symbol with no signature, receiver or nested type
    pub fn new(
        import_path: impl Into<String>,
        package: impl Into<String>,
        kind: SymbolKind,
        name: impl Into<String>,
        doc: impl Into<String>,
    ) -> Self {
        Self {
            import_path: import_path.into(),
            package: package.into(),
            kind,
            name: name.into(),
            receiver: String::new(),
            receiver_name: String::new(),
            receiver_type: String::new(),
            args: None,
            returns: None,
            type_doc: None,
            doc: doc.into(),
            html: LazyHtml::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.doc
    }

    /// Symbol doc rendered as HTML with top-level headings at `<h3>`.
    ///
    /// Rendered on first call; later calls return the same string.
    pub fn html(&self) -> &str {
        self.html.get_or_render(&self.doc, SYMBOL_HEADING_LEVEL)
    }

    pub fn is_html_rendered(&self) -> bool {
        self.html.is_rendered()
    }
}

/// Result of a documentation load: a whole package or one symbol
#[derive(Debug, Serialize, JsonSchema, PartialEq, Clone)]
#[serde(untagged)]
pub enum DocResult {
    Package(PackageDoc),
    Symbol(SymbolDoc),
}

impl DocResult {
    pub fn text(&self) -> &str {
        match self {
            DocResult::Package(pkg) => pkg.text(),
            DocResult::Symbol(sym) => sym.text(),
        }
    }

    pub fn html(&self) -> &str {
        match self {
            DocResult::Package(pkg) => pkg.html(),
            DocResult::Symbol(sym) => sym.html(),
        }
    }

    /// Convert to a JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"error":"Failed to serialize response"}"#.to_string())
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|_| r#"{"error":"Failed to serialize response"}"#.to_string())
    }

    pub fn as_package(&self) -> Option<&PackageDoc> {
        match self {
            DocResult::Package(pkg) => Some(pkg),
            DocResult::Symbol(_) => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&SymbolDoc> {
        match self {
            DocResult::Symbol(sym) => Some(sym),
            DocResult::Package(_) => None,
        }
    }
}
