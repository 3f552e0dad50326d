//! Wire model produced by the language front-end
//!
//! The syntax half mirrors what a doc reader sees after grouping declarations
//! by type: constructors, methods and typed consts/vars hang off their type.
//! The optional semantic half carries type-checked signatures keyed by
//! qualified name (`Func` or `Type.Method`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Syntax-level view of one package
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct PackageSyntax {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub consts: Vec<ValueSyntax>,
    #[serde(default)]
    pub vars: Vec<ValueSyntax>,
    #[serde(default)]
    pub funcs: Vec<FuncSyntax>,
    #[serde(default)]
    pub types: Vec<TypeSyntax>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct ValueSyntax {
    pub names: Vec<String>,
    #[serde(default)]
    pub doc: String,
}

/// One parameter list entry: `a, b int` has two names, `int` has none
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct ParamSyntax {
    #[serde(default)]
    pub names: Vec<String>,
    /// Type as written, `...T` for a variadic parameter
    #[serde(rename = "type")]
    pub type_expr: String,
}

impl ParamSyntax {
    pub fn new(names: &[&str], type_expr: &str) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            type_expr: type_expr.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct FuncSyntax {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recv: Option<ParamSyntax>,
    #[serde(default)]
    pub params: Vec<ParamSyntax>,
    #[serde(default)]
    pub results: Vec<ParamSyntax>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TypeSyntax {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    pub body: TypeBody,
    #[serde(default)]
    pub consts: Vec<ValueSyntax>,
    #[serde(default)]
    pub vars: Vec<ValueSyntax>,
    /// Functions returning this type
    #[serde(default)]
    pub funcs: Vec<FuncSyntax>,
    #[serde(default)]
    pub methods: Vec<FuncSyntax>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeBody {
    Struct {
        #[serde(default)]
        fields: Vec<FieldSyntax>,
    },
    Interface {
        #[serde(default)]
        elems: Vec<InterfaceElem>,
    },
    Alias {
        target: String,
    },
    Other {
        expr: String,
    },
}

impl TypeBody {
    pub fn is_interface(&self) -> bool {
        matches!(self, TypeBody::Interface { .. })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct FieldSyntax {
    /// Empty for an embedded field
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(rename = "type")]
    pub type_expr: String,
    #[serde(default)]
    pub doc: String,
    /// Trailing line comment
    #[serde(default)]
    pub comment: String,
    /// Tag literal including its backticks
    #[serde(default)]
    pub tag: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InterfaceElem {
    Method {
        name: String,
        #[serde(default)]
        params: Vec<ParamSyntax>,
        #[serde(default)]
        results: Vec<ParamSyntax>,
        #[serde(default)]
        doc: String,
        #[serde(default)]
        comment: String,
    },
    Embedded {
        #[serde(rename = "type")]
        type_expr: String,
        #[serde(default)]
        doc: String,
        #[serde(default)]
        comment: String,
    },
}

impl InterfaceElem {
    /// Leading doc, falling back to the trailing comment
    pub fn doc_text(&self) -> &str {
        let (doc, comment) = match self {
            InterfaceElem::Method { doc, comment, .. } => (doc, comment),
            InterfaceElem::Embedded { doc, comment, .. } => (doc, comment),
        };
        if doc.is_empty() { comment } else { doc }
    }
}

impl FieldSyntax {
    /// Leading doc, falling back to the trailing comment
    pub fn doc_text(&self) -> &str {
        if self.doc.is_empty() {
            &self.comment
        } else {
            &self.doc
        }
    }
}

/// Type-checked information for a package
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct TypeInfo {
    /// Signatures keyed by `Func` or `Type.Method`
    #[serde(default)]
    pub signatures: HashMap<String, Signature>,
    /// Receiver types keyed by `Type.Method`, e.g. `*bytes.Buffer`
    #[serde(default)]
    pub receivers: HashMap<String, String>,
    /// Resolved field types per struct, one per field declaration
    #[serde(default)]
    pub fields: HashMap<String, Vec<String>>,
    /// Complete method sets of interface types, embedded methods included
    #[serde(default)]
    pub interfaces: HashMap<String, Vec<MethodSignature>>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Signature {
    #[serde(default)]
    pub params: Vec<Var>,
    #[serde(default)]
    pub results: Vec<Var>,
    /// Whether the final parameter is variadic; its type is then `[]T`
    #[serde(default)]
    pub variadic: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Var {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Var {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct MethodSignature {
    pub name: String,
    pub signature: Signature,
}
