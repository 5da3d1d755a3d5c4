//! Naming helpers and built-in identifier tables.

use phf::phf_set;
use smol_str::SmolStr;
use swc_ecma_ast::{ObjectPatProp, Pat};

/// Identifiers template expressions may use without qualification.
static GLOBAL_ALLOWLIST: phf::Set<&'static str> = phf_set! {
    "Infinity", "undefined", "NaN", "true", "false", "null", "this",
    "Array", "Boolean", "Date", "Error", "Function", "JSON", "Math",
    "Number", "Object", "Promise", "Proxy", "Reflect", "RegExp",
    "Set", "String", "Symbol", "Map", "WeakMap", "WeakSet", "BigInt",
    "Intl", "parseInt", "parseFloat", "isNaN", "isFinite",
    "decodeURI", "decodeURIComponent", "encodeURI", "encodeURIComponent",
    "arguments", "console", "window", "document", "navigator", "globalThis",
    "require", "$event",
};

/// Components that resolve through the global component registry.
static BUILTIN_COMPONENTS: phf::Set<&'static str> = phf_set! {
    "Transition", "TransitionGroup", "KeepAlive", "Suspense", "Teleport", "BaseTransition",
    "transition", "transition-group", "keep-alive", "suspense", "teleport", "base-transition",
};

/// Returns true for names that are never read from the template context.
#[inline]
pub fn is_global_allowed(name: &str) -> bool {
    GLOBAL_ALLOWLIST.contains(name)
}

#[inline]
pub fn is_builtin_component(name: &str) -> bool {
    BUILTIN_COMPONENTS.contains(name)
}

/// `foo-bar` -> `fooBar`
pub fn camelize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper = false;
    for c in s.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    if upper {
        out.push('-');
    }
    out
}

/// Uppercases the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `my-button` -> `MyButton`
pub fn pascalize(s: &str) -> String {
    capitalize(&camelize(s))
}

/// The handler prop name for an event: `click` -> `onClick`,
/// `update:modelValue` -> `onUpdate:modelValue`.
pub fn to_handler_key(event: &str) -> String {
    format!("on{}", capitalize(&camelize(event)))
}

/// Returns true when `s` is a plain JavaScript identifier.
pub fn is_simple_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Quotes `s` as a JavaScript string literal.
pub fn string_literal(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Collects the names bound by a pattern, in source order.
pub fn collect_pattern_names(pat: &Pat, out: &mut Vec<SmolStr>) {
    match pat {
        Pat::Ident(binding) => out.push(SmolStr::new(&*binding.id.sym)),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                collect_pattern_names(elem, out);
            }
        }
        Pat::Rest(rest) => collect_pattern_names(&rest.arg, out),
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => collect_pattern_names(&kv.value, out),
                    ObjectPatProp::Assign(assign) => {
                        out.push(SmolStr::new(&*assign.key.id.sym))
                    }
                    ObjectPatProp::Rest(rest) => collect_pattern_names(&rest.arg, out),
                }
            }
        }
        Pat::Assign(assign) => collect_pattern_names(&assign.left, out),
        Pat::Invalid(_) | Pat::Expr(_) => {}
    }
}
