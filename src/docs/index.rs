//! Symbol index: qualified name -> [`SymbolDoc`]

use std::collections::HashMap;

use crate::frontend::LoadedUnit;
use crate::frontend::syntax::ValueSyntax;

use super::extract::{doc_text, func_doc, interface_docs, to_type_doc};
use super::outputs::{FuncDoc, MethodDoc, SymbolDoc, SymbolKind, TypeDoc};
use super::signature::receiver_display_name;

pub type SymbolIndex = HashMap<String, SymbolDoc>;

struct IndexBuilder<'a> {
    import_path: &'a str,
    package: &'a str,
    index: SymbolIndex,
}

impl IndexBuilder<'_> {
    /// First registration of a key wins
    fn add(&mut self, key: String, doc: SymbolDoc) {
        if key.is_empty() {
            return;
        }
        self.index.entry(key).or_insert(doc);
    }

    fn symbol(&self, kind: SymbolKind, name: &str, doc: &str) -> SymbolDoc {
        SymbolDoc::new(self.import_path, self.package, kind, name, doc_text(doc))
    }

    fn type_symbol(&self, td: TypeDoc) -> SymbolDoc {
        let mut sym = self.symbol(SymbolKind::Type, &td.name, &td.doc);
        sym.type_doc = Some(td);
        sym
    }

    fn func_symbol(&self, f: &FuncDoc) -> SymbolDoc {
        let mut sym = self.symbol(SymbolKind::Func, &f.name, &f.doc);
        sym.args = Some(f.args.clone());
        sym.returns = Some(f.returns.clone());
        sym
    }

    fn method_symbol(&self, m: &MethodDoc) -> SymbolDoc {
        let recv_type = if m.recv_type.is_empty() {
            &m.recv
        } else {
            &m.recv_type
        };
        let mut sym = self.symbol(SymbolKind::Method, &m.name, &m.doc);
        sym.receiver = receiver_display_name(recv_type);
        sym.receiver_name = m.recv_name.clone();
        sym.receiver_type = recv_type.clone();
        sym.args = Some(m.args.clone());
        sym.returns = Some(m.returns.clone());
        sym
    }

    fn add_values(&mut self, kind: SymbolKind, values: &[ValueSyntax]) {
        for value in values {
            for name in &value.names {
                let sym = self.symbol(kind, name, &value.doc);
                self.add(name.clone(), sym);
            }
        }
    }
}

/// Indexes every symbol of a loaded unit.
///
/// Types come first in name order, each followed by its methods, its
/// constructors (under `Type.Func` and `Func`) and its consts and vars.
/// Package-level funcs, consts and vars follow.
pub fn build_symbol_index(unit: &LoadedUnit) -> SymbolIndex {
    let pkg = &unit.package;
    let info = unit.types.as_ref();
    let iface_docs = interface_docs(pkg);

    let mut builder = IndexBuilder {
        import_path: &unit.pkg_path,
        package: &pkg.name,
        index: SymbolIndex::new(),
    };

    let mut types: Vec<_> = pkg.types.iter().collect();
    types.sort_by(|a, b| a.name.cmp(&b.name));

    for ty in types {
        let td = to_type_doc(ty, info, &iface_docs);
        let methods = td.methods.clone();
        let sym = builder.type_symbol(td);
        builder.add(ty.name.clone(), sym);

        for m in &methods {
            let sym = builder.method_symbol(m);
            builder.add(format!("{}.{}", ty.name, m.name), sym);
        }

        for f in &ty.funcs {
            let fd = func_doc(f, info);
            let sym = builder.func_symbol(&fd);
            builder.add(format!("{}.{}", ty.name, f.name), sym.clone());
            builder.add(f.name.clone(), sym);
        }

        builder.add_values(SymbolKind::Const, &ty.consts);
        builder.add_values(SymbolKind::Var, &ty.vars);
    }

    for f in &pkg.funcs {
        let sym = builder.func_symbol(&func_doc(f, info));
        builder.add(f.name.clone(), sym);
    }

    builder.add_values(SymbolKind::Const, &pkg.consts);
    builder.add_values(SymbolKind::Var, &pkg.vars);

    builder.index
}
