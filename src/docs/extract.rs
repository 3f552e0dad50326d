//! Conversion from the front-end's syntax model to [`PackageDoc`]

use std::collections::{HashMap, HashSet};

use crate::frontend::LoadedUnit;
use crate::frontend::syntax::{
    FieldSyntax, FuncSyntax, InterfaceElem, PackageSyntax, TypeBody, TypeInfo, TypeSyntax,
    ValueSyntax,
};

use super::comment::synopsis;
use super::outputs::{FieldDoc, FuncDoc, MethodDoc, PackageDoc, TypeDoc, TypeKind, ValueDoc};
use super::signature::{extract_args, extract_results, func_signature, receiver_info, render_method};

/// Interface method name -> doc, taken from the first interface that
/// declares the method directly
pub type InterfaceDocs = HashMap<String, String>;

pub(crate) fn doc_text(raw: &str) -> String {
    raw.trim().to_string()
}

/// Whether extracting `pkg` needs type-checked information: any interface
/// that embeds another element has methods only the type checker can list
pub fn requires_type_info(pkg: &PackageSyntax) -> bool {
    pkg.types.iter().any(|ty| match &ty.body {
        TypeBody::Interface { elems } => elems
            .iter()
            .any(|e| matches!(e, InterfaceElem::Embedded { .. })),
        _ => false,
    })
}

pub fn interface_docs(pkg: &PackageSyntax) -> InterfaceDocs {
    let mut docs = InterfaceDocs::new();
    for ty in &pkg.types {
        let TypeBody::Interface { elems } = &ty.body else {
            continue;
        };
        for elem in elems {
            if let InterfaceElem::Method { name, .. } = elem {
                docs.entry(name.clone())
                    .or_insert_with(|| doc_text(elem.doc_text()));
            }
        }
    }
    docs
}

pub fn value_doc(value: &ValueSyntax) -> ValueDoc {
    ValueDoc {
        names: value.names.clone(),
        doc: doc_text(&value.doc),
    }
}

pub fn func_doc(func: &FuncSyntax, info: Option<&TypeInfo>) -> FuncDoc {
    let (args, returns) = func_signature(func, None, info);
    FuncDoc {
        name: func.name.clone(),
        args,
        returns,
        doc: doc_text(&func.doc),
    }
}

/// Builds the package documentation. Type-associated consts, vars and
/// constructors are folded into the package-level collections.
pub fn to_pkg_doc(unit: &LoadedUnit) -> PackageDoc {
    let pkg = &unit.package;
    let info = unit.types.as_ref();
    let iface_docs = interface_docs(pkg);

    let mut consts: Vec<ValueDoc> = pkg.consts.iter().map(value_doc).collect();
    let mut vars: Vec<ValueDoc> = pkg.vars.iter().map(value_doc).collect();
    let mut funcs: Vec<FuncDoc> = pkg.funcs.iter().map(|f| func_doc(f, info)).collect();
    let mut types = Vec::with_capacity(pkg.types.len());

    for ty in &pkg.types {
        consts.extend(ty.consts.iter().map(value_doc));
        vars.extend(ty.vars.iter().map(value_doc));
        funcs.extend(ty.funcs.iter().map(|f| func_doc(f, info)));
        types.push(to_type_doc(ty, info, &iface_docs));
    }

    let mut doc = PackageDoc {
        import_path: unit.pkg_path.clone(),
        name: pkg.name.clone(),
        synopsis: synopsis(&pkg.doc),
        doc: doc_text(&pkg.doc),
        consts,
        vars,
        funcs,
        types,
        ..Default::default()
    };
    doc.sort();
    doc
}

pub fn to_type_doc(ty: &TypeSyntax, info: Option<&TypeInfo>, iface_docs: &InterfaceDocs) -> TypeDoc {
    let mut methods = Vec::with_capacity(ty.methods.len());
    let mut seen = HashSet::new();

    for m in &ty.methods {
        let (recv_name, mut recv_type) = receiver_info(m, &ty.name, info);
        if recv_type.is_empty() {
            recv_type = ty.name.clone();
        }
        let (args, returns) = func_signature(m, Some(&ty.name), info);
        seen.insert(m.name.clone());
        methods.push(MethodDoc {
            recv: ty.name.clone(),
            recv_name,
            recv_type,
            name: m.name.clone(),
            args,
            returns,
            doc: doc_text(&m.doc),
        });
    }

    if let TypeBody::Interface { elems } = &ty.body {
        for method in interface_methods(ty, elems, info, iface_docs) {
            if seen.insert(method.name.clone()) {
                methods.push(method);
            }
        }
    }

    methods.sort_by(|a, b| a.name.cmp(&b.name));

    let fields = match &ty.body {
        TypeBody::Struct { fields } => struct_fields(&ty.name, fields, info),
        _ => Vec::new(),
    };

    TypeDoc {
        name: ty.name.clone(),
        doc: doc_text(&ty.doc),
        decl: render_decl(ty),
        kind: type_kind(&ty.body),
        fields,
        methods,
    }
}

fn type_kind(body: &TypeBody) -> TypeKind {
    match body {
        TypeBody::Struct { .. } => TypeKind::Struct,
        TypeBody::Interface { .. } => TypeKind::Interface,
        TypeBody::Alias { .. } => TypeKind::Alias,
        TypeBody::Other { .. } => TypeKind::Other,
    }
}

/// Directly declared methods first, then the rest of the complete method
/// set. Promoted methods borrow their doc from the interface declaring them.
fn interface_methods(
    ty: &TypeSyntax,
    elems: &[InterfaceElem],
    info: Option<&TypeInfo>,
    iface_docs: &InterfaceDocs,
) -> Vec<MethodDoc> {
    let method_set = info.and_then(|info| info.interfaces.get(&ty.name));
    let mut methods = Vec::new();
    let mut seen = HashSet::new();

    for elem in elems {
        let InterfaceElem::Method {
            name,
            params,
            results,
            ..
        } = elem
        else {
            continue;
        };
        if !seen.insert(name.clone()) {
            continue;
        }
        let sig = method_set
            .and_then(|set| set.iter().find(|m| &m.name == name))
            .map(|m| &m.signature);
        methods.push(MethodDoc {
            recv: ty.name.clone(),
            recv_name: String::new(),
            recv_type: ty.name.clone(),
            name: name.clone(),
            args: extract_args(params, sig),
            returns: extract_results(results, sig),
            doc: doc_text(elem.doc_text()),
        });
    }

    for promoted in method_set.into_iter().flatten() {
        if !seen.insert(promoted.name.clone()) {
            continue;
        }
        methods.push(MethodDoc {
            recv: ty.name.clone(),
            recv_name: String::new(),
            recv_type: ty.name.clone(),
            name: promoted.name.clone(),
            args: extract_args(&[], Some(&promoted.signature)),
            returns: extract_results(&[], Some(&promoted.signature)),
            doc: iface_docs.get(&promoted.name).cloned().unwrap_or_default(),
        });
    }

    methods
}

fn struct_fields(type_name: &str, fields: &[FieldSyntax], info: Option<&TypeInfo>) -> Vec<FieldDoc> {
    let resolved = info.and_then(|info| info.fields.get(type_name));
    let mut out = Vec::with_capacity(fields.len());

    for (i, field) in fields.iter().enumerate() {
        let type_name = resolved
            .and_then(|types| types.get(i))
            .filter(|t| !t.is_empty())
            .cloned()
            .unwrap_or_else(|| field.type_expr.clone());
        let doc = doc_text(field.doc_text());
        let tag = field.tag.trim_matches('`').to_string();

        if field.names.is_empty() {
            out.push(FieldDoc {
                name: embedded_field_name(&type_name),
                type_name,
                doc,
                tag,
                embedded: true,
            });
            continue;
        }

        for name in &field.names {
            out.push(FieldDoc {
                name: name.clone(),
                type_name: type_name.clone(),
                doc: doc.clone(),
                tag: tag.clone(),
                embedded: false,
            });
        }
    }

    out
}

/// `*sync.Mutex` -> `sync.Mutex`
fn embedded_field_name(type_name: &str) -> String {
    type_name.strip_prefix('*').unwrap_or(type_name).to_string()
}

/// Source-like declaration with member comments as `//` lines
pub fn render_decl(ty: &TypeSyntax) -> String {
    match &ty.body {
        TypeBody::Struct { fields } => {
            let mut lines = vec![format!("type {} struct {{", ty.name)];
            for field in fields {
                lines.extend(comment_lines(field.doc_text()));
                let mut entry = if field.names.is_empty() {
                    field.type_expr.clone()
                } else {
                    format!("{} {}", field.names.join(", "), field.type_expr)
                };
                if !field.tag.is_empty() {
                    entry.push(' ');
                    entry.push_str(&field.tag);
                }
                lines.push(format!("  {entry}"));
            }
            lines.push("}".to_string());
            lines.join("\n")
        }
        TypeBody::Interface { elems } => {
            let mut lines = vec![format!("type {} interface {{", ty.name)];
            for elem in elems {
                lines.extend(comment_lines(elem.doc_text()));
                let entry = match elem {
                    InterfaceElem::Method {
                        name,
                        params,
                        results,
                        ..
                    } => render_method(name, params, results),
                    InterfaceElem::Embedded { type_expr, .. } => type_expr.clone(),
                };
                lines.push(format!("  {entry}"));
            }
            lines.push("}".to_string());
            lines.join("\n")
        }
        TypeBody::Alias { target } => format!("type {} = {}", ty.name, target),
        TypeBody::Other { expr } => format!("type {} {}", ty.name, expr),
    }
}

fn comment_lines(raw: &str) -> Vec<String> {
    let text = raw.trim_end_matches('\n');
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n')
        .map(|segment| match segment.trim_end() {
            "" => "  //".to_string(),
            line => format!("  // {line}"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::syntax::{MethodSignature, ParamSyntax, Signature, Var};

    fn reader_iface() -> TypeSyntax {
        TypeSyntax {
            name: "Reader".into(),
            doc: "Reader reads.\n".into(),
            body: TypeBody::Interface {
                elems: vec![InterfaceElem::Method {
                    name: "Read".into(),
                    params: vec![ParamSyntax::new(&["p"], "[]byte")],
                    results: vec![
                        ParamSyntax::new(&["n"], "int"),
                        ParamSyntax::new(&["err"], "error"),
                    ],
                    doc: "Read fills p.\n".into(),
                    comment: String::new(),
                }],
            },
            consts: vec![],
            vars: vec![],
            funcs: vec![],
            methods: vec![],
        }
    }

    fn read_writer_iface() -> TypeSyntax {
        TypeSyntax {
            name: "ReadWriter".into(),
            doc: String::new(),
            body: TypeBody::Interface {
                elems: vec![
                    InterfaceElem::Embedded {
                        type_expr: "Reader".into(),
                        doc: String::new(),
                        comment: String::new(),
                    },
                    InterfaceElem::Method {
                        name: "Write".into(),
                        params: vec![ParamSyntax::new(&["p"], "[]byte")],
                        results: vec![
                            ParamSyntax::new(&["n"], "int"),
                            ParamSyntax::new(&["err"], "error"),
                        ],
                        doc: String::new(),
                        comment: "Write drains p.".into(),
                    },
                ],
            },
            consts: vec![],
            vars: vec![],
            funcs: vec![],
            methods: vec![],
        }
    }

    fn rw_signature() -> Signature {
        Signature {
            params: vec![Var::new("p", "[]byte")],
            results: vec![Var::new("n", "int"), Var::new("err", "error")],
            variadic: false,
        }
    }

    fn io_package() -> PackageSyntax {
        PackageSyntax {
            name: "io".into(),
            doc: "Package io provides I/O primitives.".into(),
            types: vec![read_writer_iface(), reader_iface()],
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_type_info_only_for_embedding_interfaces() {
        assert!(requires_type_info(&io_package()));

        let plain = PackageSyntax {
            name: "p".into(),
            types: vec![reader_iface()],
            ..Default::default()
        };
        assert!(!requires_type_info(&plain));
    }

    #[test]
    fn test_promoted_interface_methods_borrow_docs() {
        let mut info = TypeInfo::default();
        info.interfaces.insert(
            "ReadWriter".into(),
            vec![
                MethodSignature {
                    name: "Read".into(),
                    signature: rw_signature(),
                },
                MethodSignature {
                    name: "Write".into(),
                    signature: rw_signature(),
                },
            ],
        );

        let pkg = io_package();
        let docs = interface_docs(&pkg);
        let td = to_type_doc(&read_writer_iface(), Some(&info), &docs);

        assert_eq!(td.kind, TypeKind::Interface);
        let names: Vec<_> = td.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Read", "Write"]);

        let read = &td.methods[0];
        assert_eq!(read.doc, "Read fills p.");
        assert_eq!(read.recv, "ReadWriter");
        assert_eq!(read.args[0].type_name, "[]byte");

        // Direct declaration keeps its own doc
        assert_eq!(td.methods[1].doc, "Write drains p.");
    }

    #[test]
    fn test_interface_without_type_info_lists_direct_methods() {
        let td = to_type_doc(&read_writer_iface(), None, &InterfaceDocs::new());
        assert_eq!(td.methods.len(), 1);
        assert_eq!(td.methods[0].name, "Write");
        assert_eq!(td.methods[0].returns.len(), 2);
    }

    #[test]
    fn test_interface_decl_rendering() {
        let td = to_type_doc(&read_writer_iface(), None, &InterfaceDocs::new());
        assert_eq!(
            td.decl,
            "type ReadWriter interface {\n  Reader\n  // Write drains p.\n  Write(p []byte) (n int, err error)\n}"
        );
    }

    #[test]
    fn test_struct_fields_and_decl() {
        let ty = TypeSyntax {
            name: "Config".into(),
            doc: "Config holds settings.".into(),
            body: TypeBody::Struct {
                fields: vec![
                    FieldSyntax {
                        names: vec!["Name".into()],
                        type_expr: "string".into(),
                        doc: "Name is the display name.\n\nIt may be empty.\n".into(),
                        comment: String::new(),
                        tag: "`json:\"name\"`".into(),
                    },
                    FieldSyntax {
                        names: vec![],
                        type_expr: "*sync.Mutex".into(),
                        doc: String::new(),
                        comment: "guards state".into(),
                        tag: String::new(),
                    },
                    FieldSyntax {
                        names: vec!["X".into(), "Y".into()],
                        type_expr: "Coord".into(),
                        ..Default::default()
                    },
                ],
            },
            consts: vec![],
            vars: vec![],
            funcs: vec![],
            methods: vec![],
        };

        let mut info = TypeInfo::default();
        info.fields.insert(
            "Config".into(),
            vec!["string".into(), "*sync.Mutex".into(), "example.com/geo.Coord".into()],
        );

        let td = to_type_doc(&ty, Some(&info), &InterfaceDocs::new());
        assert_eq!(td.kind, TypeKind::Struct);
        assert_eq!(td.fields.len(), 4);

        assert_eq!(td.fields[0].name, "Name");
        assert_eq!(td.fields[0].tag, "json:\"name\"");
        assert_eq!(td.fields[0].doc, "Name is the display name.\n\nIt may be empty.");

        assert!(td.fields[1].embedded);
        assert_eq!(td.fields[1].name, "sync.Mutex");
        assert_eq!(td.fields[1].doc, "guards state");

        assert_eq!(td.fields[3].name, "Y");
        assert_eq!(td.fields[3].type_name, "example.com/geo.Coord");

        assert_eq!(
            td.decl,
            "type Config struct {\n  // Name is the display name.\n  //\n  // It may be empty.\n  Name string `json:\"name\"`\n  // guards state\n  *sync.Mutex\n  X, Y Coord\n}"
        );
    }

    #[test]
    fn test_alias_and_other_decls() {
        let alias = TypeSyntax {
            name: "Byte".into(),
            doc: String::new(),
            body: TypeBody::Alias {
                target: "uint8".into(),
            },
            consts: vec![],
            vars: vec![],
            funcs: vec![],
            methods: vec![],
        };
        let td = to_type_doc(&alias, None, &InterfaceDocs::new());
        assert_eq!(td.kind, TypeKind::Alias);
        assert_eq!(td.decl, "type Byte = uint8");

        let other = TypeSyntax {
            body: TypeBody::Other {
                expr: "func(int) bool".into(),
            },
            name: "Pred".into(),
            ..alias
        };
        assert_eq!(render_decl(&other), "type Pred func(int) bool");
    }

    #[test]
    fn test_embedded_field_name() {
        assert_eq!(embedded_field_name("*sync.Mutex"), "sync.Mutex");
        assert_eq!(
            embedded_field_name("example.com/x/list.List[T]"),
            "example.com/x/list.List[T]"
        );
        assert_eq!(embedded_field_name("Base"), "Base");
    }

    #[test]
    fn test_pkg_doc_folds_type_members_and_sorts() {
        let mut info = TypeInfo::default();
        info.receivers.insert("Buffer.Len".into(), "*bytes.Buffer".into());

        let buffer = TypeSyntax {
            name: "Buffer".into(),
            doc: "A Buffer is a variable-sized buffer of bytes.".into(),
            body: TypeBody::Struct { fields: vec![] },
            consts: vec![ValueSyntax {
                names: vec!["MinRead".into()],
                doc: "MinRead is the minimum slice size.".into(),
            }],
            vars: vec![],
            funcs: vec![FuncSyntax {
                name: "NewBuffer".into(),
                params: vec![ParamSyntax::new(&["buf"], "[]byte")],
                results: vec![ParamSyntax::new(&[], "*Buffer")],
                ..Default::default()
            }],
            methods: vec![FuncSyntax {
                name: "Len".into(),
                recv: Some(ParamSyntax::new(&["b"], "*Buffer")),
                results: vec![ParamSyntax::new(&[], "int")],
                ..Default::default()
            }],
        };

        let unit = LoadedUnit {
            pkg_path: "bytes".into(),
            package: PackageSyntax {
                name: "bytes".into(),
                doc: "Package bytes implements functions for the manipulation of byte slices.\n"
                    .into(),
                consts: vec![ValueSyntax {
                    names: vec!["A".into()],
                    doc: String::new(),
                }],
                funcs: vec![FuncSyntax {
                    name: "Equal".into(),
                    ..Default::default()
                }],
                types: vec![buffer],
                ..Default::default()
            },
            types: Some(info),
            module: None,
        };

        let doc = to_pkg_doc(&unit);
        assert_eq!(doc.import_path, "bytes");
        assert_eq!(
            doc.synopsis,
            "Package bytes implements functions for the manipulation of byte slices."
        );
        let consts: Vec<_> = doc.consts.iter().map(|c| c.sort_key()).collect();
        assert_eq!(consts, vec!["A", "MinRead"]);
        let funcs: Vec<_> = doc.funcs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(funcs, vec!["Equal", "NewBuffer"]);

        let len = &doc.types[0].methods[0];
        assert_eq!(len.recv, "Buffer");
        assert_eq!(len.recv_name, "b");
        assert_eq!(len.recv_type, "*bytes.Buffer");
        assert_eq!(len.returns, vec![crate::docs::ArgInfo::new("", "int")]);
    }
}
