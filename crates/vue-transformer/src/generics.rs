//! The setup script's `generic` attribute.
//!
//! Generated declarations repeat the component's type parameters. Synthesized
//! exports re-declare them under prefixed names so they can never collide with
//! the user's own types.

use rustc_hash::FxHashMap;

/// A single type parameter, e.g. `T extends string = "a"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericParam {
    pub name: String,
    pub definition: String,
}

/// The parsed `generic="..."` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericInfo {
    pub params: Vec<GenericParam>,
}

impl GenericInfo {
    pub fn parse(source: &str) -> Self {
        Self {
            params: parse_generic_declarations(source),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// `<T extends string, U>`, or empty.
    pub fn defs(&self) -> String {
        wrap(self.params.iter().map(|p| p.definition.clone()))
    }

    /// `<T, U>`, or empty.
    pub fn refs(&self) -> String {
        wrap(self.params.iter().map(|p| p.name.clone()))
    }
}

/// Renames type parameters under a prefix, memoizing the results.
#[derive(Debug, Clone)]
pub struct GenericSanitizer {
    prefix: String,
    cache: FxHashMap<String, String>,
}

impl GenericSanitizer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            cache: FxHashMap::default(),
        }
    }

    pub fn sanitize(&mut self, name: &str) -> String {
        if let Some(hit) = self.cache.get(name) {
            return hit.clone();
        }
        let sanitized = format!("{}{}", self.prefix, name);
        self.cache.insert(name.to_string(), sanitized.clone());
        sanitized
    }

    /// Definitions with every parameter renamed and defaulted to `any`.
    pub fn defs(&mut self, info: &GenericInfo) -> String {
        let names: Vec<&str> = info.params.iter().map(|p| p.name.as_str()).collect();
        let defs: Vec<String> = info
            .params
            .iter()
            .map(|param| {
                let renamed = rename_identifiers(&param.definition, &names, |n| self.sanitize(n));
                if has_default(&renamed) {
                    renamed
                } else {
                    format!("{renamed} = any")
                }
            })
            .collect();
        wrap(defs.into_iter())
    }

    /// References to the renamed parameters.
    pub fn refs(&mut self, info: &GenericInfo) -> String {
        let refs: Vec<String> = info.params.iter().map(|p| self.sanitize(&p.name)).collect();
        wrap(refs.into_iter())
    }
}

fn wrap(parts: impl Iterator<Item = String>) -> String {
    let parts: Vec<String> = parts.collect();
    if parts.is_empty() {
        return String::new();
    }
    format!("<{}>", parts.join(", "))
}

fn parse_generic_declarations(generics: &str) -> Vec<GenericParam> {
    split_generics(generics)
        .into_iter()
        .filter_map(|param| {
            let param = param.trim();
            if param.is_empty() {
                return None;
            }

            // Extract name up to first whitespace or '='
            let name_end = param
                .find(|c: char| c.is_whitespace() || c == '=')
                .unwrap_or(param.len());
            let name = param[..name_end].trim().to_string();
            if name.is_empty() {
                return None;
            }

            Some(GenericParam {
                name,
                definition: param.to_string(),
            })
        })
        .collect()
}

fn split_generics(generics: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut prev = '\0';

    for (i, ch) in generics.char_indices() {
        match ch {
            '<' | '(' | '[' | '{' => depth += 1,
            // `=>` in function types does not close anything
            '>' if prev == '=' => {}
            '>' | ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
            }
            ',' if depth == 0 => {
                parts.push(generics[start..i].to_string());
                start = i + 1;
            }
            _ => {}
        }
        prev = ch;
    }

    if start < generics.len() {
        parts.push(generics[start..].to_string());
    }

    parts
}

/// Whether a definition carries a top-level default.
fn has_default(definition: &str) -> bool {
    let mut depth = 0usize;
    let mut chars = definition.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '=' if depth == 0 => {
                if chars.peek() == Some(&'>') {
                    chars.next();
                } else {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Replaces whole-word occurrences of `names` outside string literals.
fn rename_identifiers(text: &str, names: &[&str], mut rename: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word = String::new();
    let mut quote: Option<char> = None;

    let mut flush = |word: &mut String, out: &mut String| {
        if !word.is_empty() {
            if names.contains(&word.as_str()) {
                out.push_str(&rename(word));
            } else {
                out.push_str(word);
            }
            word.clear();
        }
    };

    for ch in text.chars() {
        if let Some(q) = quote {
            out.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        if ch.is_alphanumeric() || ch == '_' || ch == '$' {
            word.push(ch);
            continue;
        }
        flush(&mut word, &mut out);
        if matches!(ch, '"' | '\'' | '`') {
            quote = Some(ch);
        }
        out.push(ch);
    }
    flush(&mut word, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_generics() {
        let info = GenericInfo::parse("T extends Record<string, number>, U = T");
        assert_eq!(info.params.len(), 2);
        assert_eq!(info.params[0].name, "T");
        assert_eq!(info.params[1].definition, "U = T");
        assert_eq!(info.defs(), "<T extends Record<string, number>, U = T>");
        assert_eq!(info.refs(), "<T, U>");
    }

    #[test]
    fn test_function_type_constraint() {
        let info = GenericInfo::parse("F extends (a: string) => void, K");
        assert_eq!(info.params.len(), 2);
        assert_eq!(info.params[1].name, "K");
    }

    #[test]
    fn test_empty() {
        let info = GenericInfo::parse("");
        assert!(info.is_empty());
        assert_eq!(info.defs(), "");
        assert_eq!(info.refs(), "");
    }

    #[test]
    fn test_sanitized() {
        let info = GenericInfo::parse("T extends string, U extends T[] = T[]");
        let mut sanitizer = GenericSanitizer::new("__P_");
        assert_eq!(
            sanitizer.defs(&info),
            "<__P_T extends string = any, __P_U extends __P_T[] = __P_T[]>"
        );
        assert_eq!(sanitizer.refs(&info), "<__P_T, __P_U>");
    }

    #[test]
    fn test_rename_skips_strings_and_longer_words() {
        let out = rename_identifiers(r#"T extends "T" | Tx"#, &["T"], |n| format!("_{n}"));
        assert_eq!(out, r#"_T extends "T" | Tx"#);
    }
}
