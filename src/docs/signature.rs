//! Parameter, result and receiver extraction for functions and methods

use crate::frontend::syntax::{FuncSyntax, ParamSyntax, Signature, TypeInfo};

use super::outputs::ArgInfo;

/// Key under which the front-end records a signature: `Func` or `Type.Method`
pub fn qualified_name(type_name: Option<&str>, name: &str) -> String {
    match type_name {
        Some(ty) if !ty.is_empty() => format!("{ty}.{name}"),
        _ => name.to_string(),
    }
}

/// One hint per declared parameter: the name, or empty for an unnamed field
fn name_hints(params: &[ParamSyntax]) -> Vec<&str> {
    params
        .iter()
        .flat_map(|p| {
            if p.names.is_empty() {
                vec![""]
            } else {
                p.names.iter().map(String::as_str).collect()
            }
        })
        .collect()
}

fn hinted_name(name: &str, index: usize, hints: &[&str]) -> String {
    if !name.is_empty() {
        return name.to_string();
    }
    hints.get(index).copied().unwrap_or_default().to_string()
}

/// Parameters from a type-checked signature; a variadic tail renders as `...T`
pub fn args_from_signature(sig: &Signature, hints: &[&str]) -> Vec<ArgInfo> {
    let last = sig.params.len().saturating_sub(1);
    sig.params
        .iter()
        .enumerate()
        .map(|(i, param)| {
            let mut type_name = param.type_name.clone();
            if sig.variadic && i == last {
                type_name = match param.type_name.strip_prefix("[]") {
                    Some(elem) => format!("...{elem}"),
                    None => format!("...{}", param.type_name),
                };
            }
            ArgInfo {
                name: hinted_name(&param.name, i, hints),
                type_name,
            }
        })
        .collect()
}

pub fn results_from_signature(sig: &Signature, hints: &[&str]) -> Vec<ArgInfo> {
    sig.results
        .iter()
        .enumerate()
        .map(|(i, res)| ArgInfo {
            name: hinted_name(&res.name, i, hints),
            type_name: res.type_name.clone(),
        })
        .collect()
}

/// Parameters as written: one entry per name, or one unnamed entry per field
pub fn args_from_syntax(params: &[ParamSyntax]) -> Vec<ArgInfo> {
    params
        .iter()
        .flat_map(|p| {
            if p.names.is_empty() {
                vec![ArgInfo::new("", p.type_expr.clone())]
            } else {
                p.names
                    .iter()
                    .map(|n| ArgInfo::new(n.clone(), p.type_expr.clone()))
                    .collect()
            }
        })
        .collect()
}

pub fn extract_args(params: &[ParamSyntax], sig: Option<&Signature>) -> Vec<ArgInfo> {
    match sig {
        Some(sig) => args_from_signature(sig, &name_hints(params)),
        None => args_from_syntax(params),
    }
}

pub fn extract_results(results: &[ParamSyntax], sig: Option<&Signature>) -> Vec<ArgInfo> {
    match sig {
        Some(sig) => results_from_signature(sig, &name_hints(results)),
        None => args_from_syntax(results),
    }
}

/// Args and results of a declared function or method
pub fn func_signature(
    func: &FuncSyntax,
    type_name: Option<&str>,
    info: Option<&TypeInfo>,
) -> (Vec<ArgInfo>, Vec<ArgInfo>) {
    let sig = info.and_then(|info| info.signatures.get(&qualified_name(type_name, &func.name)));
    (
        extract_args(&func.params, sig),
        extract_results(&func.results, sig),
    )
}

/// Receiver identifier and receiver type of a method declaration.
///
/// The type prefers the type-checked form (`*bytes.Buffer`) over the syntax.
pub fn receiver_info(
    func: &FuncSyntax,
    type_name: &str,
    info: Option<&TypeInfo>,
) -> (String, String) {
    let Some(recv) = &func.recv else {
        return (String::new(), String::new());
    };

    let recv_name = recv.names.first().cloned().unwrap_or_default();
    let recv_type = info
        .and_then(|info| info.receivers.get(&qualified_name(Some(type_name), &func.name)))
        .filter(|t| !t.is_empty())
        .cloned()
        .unwrap_or_else(|| recv.type_expr.clone());

    (recv_name, recv_type)
}

/// `*net/http.Client` -> `Client`
pub fn receiver_display_name(recv_type: &str) -> String {
    let mut name = recv_type.strip_prefix('*').unwrap_or(recv_type);
    name = name.strip_prefix('(').unwrap_or(name);
    name = name.strip_suffix(')').unwrap_or(name);

    if let Some(slash) = name.rfind('/') {
        name = &name[slash + 1..];
    }
    if let Some(dot) = name.rfind('.') {
        name = &name[dot + 1..];
    }
    name.to_string()
}

fn render_params(params: &[ParamSyntax]) -> String {
    params
        .iter()
        .map(|p| {
            if p.names.is_empty() {
                p.type_expr.clone()
            } else {
                format!("{} {}", p.names.join(", "), p.type_expr)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `Read(p []byte) (n int, err error)`
pub fn render_method(name: &str, params: &[ParamSyntax], results: &[ParamSyntax]) -> String {
    let mut out = format!("{name}({})", render_params(params));
    match results {
        [] => {}
        [single] if single.names.is_empty() => {
            out.push(' ');
            out.push_str(&single.type_expr);
        }
        _ => {
            out.push_str(" (");
            out.push_str(&render_params(results));
            out.push(')');
        }
    }
    out
}
