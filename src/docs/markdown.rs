//! Markdown rendering of documentation results for terminal output

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use super::outputs::{ArgInfo, DocResult, FuncDoc, MethodDoc, PackageDoc, SymbolDoc, SymbolKind, TypeKind};

static DOC_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\?\[([A-Z][A-Za-z0-9_.]*)\\?\]").expect("doc link pattern is valid")
});

const PKG_SITE: &str = "https://pkg.go.dev";

/// Markdown for a package or symbol, with doc links resolved against the
/// package site
pub fn to_markdown(result: &DocResult) -> String {
    let (import_path, markdown) = match result {
        DocResult::Package(pkg) => (pkg.import_path.as_str(), package_markdown(pkg)),
        DocResult::Symbol(sym) => {
            let md = symbol_markdown(sym);
            let md = if md.is_empty() { sym.text().to_string() } else { md };
            (sym.import_path.as_str(), md)
        }
    };
    convert_doc_links(&markdown, import_path)
}

fn code_block(out: &mut String, code: &str) {
    if !code.is_empty() {
        let _ = write!(out, "```go\n{code}\n```\n\n");
    }
}

fn paragraph(out: &mut String, text: &str) {
    if !text.is_empty() {
        let _ = write!(out, "{text}\n\n");
    }
}

pub fn package_markdown(pkg: &PackageDoc) -> String {
    let mut out = String::new();
    let _ = write!(out, "# package {}\n\n", pkg.name);
    let _ = write!(out, "```go\nimport {:?}\n```\n\n", pkg.import_path);
    paragraph(&mut out, &pkg.doc);

    for (title, values) in [("CONSTANTS", &pkg.consts), ("VARIABLES", &pkg.vars)] {
        if values.is_empty() {
            continue;
        }
        let _ = write!(out, "# {title}\n\n");
        for value in values {
            for name in &value.names {
                let _ = write!(out, "## {name}\n\n");
            }
            paragraph(&mut out, &value.doc);
        }
    }

    if !pkg.funcs.is_empty() {
        out.push_str("# FUNCTIONS\n\n");
        for f in &pkg.funcs {
            code_block(&mut out, &func_signature(f));
            paragraph(&mut out, &f.doc);
        }
    }

    if !pkg.types.is_empty() {
        out.push_str("# TYPES\n\n");
        for ty in &pkg.types {
            code_block(&mut out, &ty.decl);
            paragraph(&mut out, &ty.doc);
            // Interface methods are already part of the declaration
            if ty.kind != TypeKind::Interface {
                for m in &ty.methods {
                    code_block(&mut out, &method_signature(m));
                    paragraph(&mut out, &m.doc);
                }
            }
        }
    }

    out
}

pub fn symbol_markdown(sym: &SymbolDoc) -> String {
    let mut out = String::new();
    let _ = write!(out, "```go\n// import {:?}\n```\n\n", sym.import_path);

    if let Some(ty) = sym.type_doc.as_ref().filter(|_| sym.kind == SymbolKind::Type) {
        code_block(&mut out, &ty.decl);
        paragraph(&mut out, &sym.doc);
        if ty.kind != TypeKind::Interface {
            for m in &ty.methods {
                code_block(&mut out, &method_signature(m));
                paragraph(&mut out, &m.doc);
            }
        }
        return out;
    }

    code_block(&mut out, &symbol_signature(sym));
    if !sym.doc.is_empty() {
        let _ = writeln!(out, "{}", sym.doc);
    }
    out
}

fn format_arg(arg: &ArgInfo) -> String {
    match (arg.name.as_str(), arg.type_name.as_str()) {
        ("", "") => "_".to_string(),
        (name, "") => name.to_string(),
        ("", ty) => ty.to_string(),
        (name, ty) => format!("{name} {ty}"),
    }
}

pub fn format_params(args: &[ArgInfo]) -> String {
    args.iter().map(format_arg).collect::<Vec<_>>().join(", ")
}

/// ` T` for a single unnamed result, ` (a A, b B)` otherwise
pub fn format_returns(returns: &[ArgInfo]) -> String {
    match returns {
        [] => String::new(),
        [single] if single.name.is_empty() => format!(" {}", format_arg(single)),
        _ => format!(" ({})", format_params(returns)),
    }
}

pub fn func_signature(f: &FuncDoc) -> String {
    format!(
        "func {}({}){}",
        f.name,
        format_params(&f.args),
        format_returns(&f.returns)
    )
}

fn receiver_clause(recv_name: &str, recv_type: &str) -> String {
    match (recv_name, recv_type) {
        (_, "") => String::new(),
        ("", ty) => format!("({ty}) "),
        (name, ty) => format!("({name} {ty}) "),
    }
}

pub fn method_signature(m: &MethodDoc) -> String {
    let recv_type = if m.recv_type.is_empty() {
        &m.recv
    } else {
        &m.recv_type
    };
    format!(
        "func {}{}({}){}",
        receiver_clause(&m.recv_name, recv_type),
        m.name,
        format_params(&m.args),
        format_returns(&m.returns)
    )
}

fn symbol_signature(sym: &SymbolDoc) -> String {
    if !sym.kind.is_callable() {
        return String::new();
    }
    let (Some(args), Some(returns)) = (&sym.args, &sym.returns) else {
        return String::new();
    };
    match sym.kind {
        SymbolKind::Method => {
            let recv_type = if sym.receiver_type.is_empty() {
                &sym.receiver
            } else {
                &sym.receiver_type
            };
            format!(
                "func {}{}({}){}",
                receiver_clause(&sym.receiver_name, recv_type),
                sym.name,
                format_params(args),
                format_returns(returns)
            )
        }
        SymbolKind::Func => format!(
            "func {}({}){}",
            sym.name,
            format_params(args),
            format_returns(returns)
        ),
        _ => String::new(),
    }
}

/// `[Name]` and `[Type.Method]` become links into the package page
pub fn convert_doc_links(text: &str, import_path: &str) -> String {
    DOC_LINK_RE
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            format!("[{name}]({PKG_SITE}/{import_path}#{name})")
        })
        .into_owned()
}
