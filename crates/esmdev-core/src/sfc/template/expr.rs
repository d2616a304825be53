//! Template expressions: binding free identifiers to the render context.
//!
//! `count + 1` becomes `_ctx.count + 1`. Identifiers are left alone when they
//! are property accesses, object keys, literals or keywords, allow-listed
//! globals, or names in scope (`v-for` aliases, arrow function parameters,
//! `$event` in handlers).

use regex_lite::Regex;
use std::sync::OnceLock;

const KEYWORDS: &[&str] = &[
    "true", "false", "null", "undefined", "this", "typeof", "instanceof", "in", "of", "new",
    "void", "delete", "await", "async", "function", "return", "if", "else", "let", "const", "var",
    "class", "arguments",
];

const GLOBALS: &[&str] = &[
    "Infinity",
    "NaN",
    "isFinite",
    "isNaN",
    "parseFloat",
    "parseInt",
    "decodeURI",
    "decodeURIComponent",
    "encodeURI",
    "encodeURIComponent",
    "Math",
    "Number",
    "Date",
    "Array",
    "Object",
    "Boolean",
    "String",
    "RegExp",
    "Map",
    "Set",
    "JSON",
    "Intl",
    "BigInt",
    "console",
    "window",
    "document",
];

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Prefix free identifiers in `expr` with `_ctx.`; `locals` are in scope.
#[must_use]
pub fn prefix_identifiers(expr: &str, locals: &[String]) -> String {
    let chars: Vec<char> = expr.chars().collect();
    let mut scope = locals.to_vec();
    let mut out = String::with_capacity(expr.len() + 16);
    // '{' object literal, 'b' block body, '(' and '[' as written.
    let mut brackets: Vec<char> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let end = skip_string(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            '`' => i = template_literal(&chars, i, &scope, &mut out),
            '0'..='9' => {
                while i < chars.len() && (is_ident_part(chars[i]) || chars[i] == '.') {
                    out.push(chars[i]);
                    i += 1;
                }
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_part(chars[i]) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                let prev = prev_significant(&chars, start);
                let next = next_significant(&chars, i).map(|k| chars[k]);

                let member = prev.is_some_and(|p| chars[p] == '.' && !is_spread(&chars, p));
                let object_slot = brackets.last() == Some(&'{')
                    && prev.is_some_and(|p| matches!(chars[p], '{' | ','));

                if member || (object_slot && next == Some(':')) {
                    out.push_str(&name);
                    continue;
                }
                if arrow_follows(&chars, i) {
                    scope.push(name.clone());
                    out.push_str(&name);
                    continue;
                }

                let free = !KEYWORDS.contains(&name.as_str())
                    && !GLOBALS.contains(&name.as_str())
                    && !scope.contains(&name);
                if object_slot && matches!(next, Some(',' | '}') | None) {
                    // `{ a }` shorthand
                    out.push_str(&name);
                    if free {
                        out.push_str(": _ctx.");
                        out.push_str(&name);
                    }
                    continue;
                }
                if free {
                    out.push_str("_ctx.");
                }
                out.push_str(&name);
            }
            '(' => {
                if let Some(params) = arrow_params(&chars, i) {
                    scope.extend(params);
                }
                brackets.push('(');
                out.push(c);
                i += 1;
            }
            '{' => {
                let block = prev_significant(&chars, i)
                    .is_some_and(|p| p > 0 && chars[p] == '>' && chars[p - 1] == '=');
                brackets.push(if block { 'b' } else { '{' });
                out.push(c);
                i += 1;
            }
            '[' => {
                brackets.push('[');
                out.push(c);
                i += 1;
            }
            ')' | '}' | ']' => {
                brackets.pop();
                out.push(c);
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// End index (exclusive) of the string literal starting at `start`.
fn skip_string(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

/// Copy a template literal, prefixing its `${}` substitutions. Returns the
/// index past the closing backtick.
fn template_literal(chars: &[char], start: usize, scope: &[String], out: &mut String) -> usize {
    out.push('`');
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                out.extend(&chars[i..(i + 2).min(chars.len())]);
                i += 2;
            }
            '`' => {
                out.push('`');
                return i + 1;
            }
            '$' if chars.get(i + 1) == Some(&'{') => {
                let close = matching_close(chars, i + 1).unwrap_or(chars.len());
                let inner: String = chars[i + 2..close].iter().collect();
                out.push_str("${");
                out.push_str(&prefix_identifiers(&inner, scope));
                out.push('}');
                i = close + 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    chars.len()
}

/// Index of the bracket closing the one at `open`.
fn matching_close(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\'' | '"' | '`' => {
                i = skip_string(chars, i);
                continue;
            }
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn prev_significant(chars: &[char], before: usize) -> Option<usize> {
    (0..before).rev().find(|&k| !chars[k].is_whitespace())
}

fn next_significant(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len()).find(|&k| !chars[k].is_whitespace())
}

fn is_spread(chars: &[char], dot: usize) -> bool {
    dot >= 2 && chars[dot - 1] == '.' && chars[dot - 2] == '.'
}

fn arrow_follows(chars: &[char], from: usize) -> bool {
    next_significant(chars, from).is_some_and(|k| chars[k] == '=' && chars.get(k + 1) == Some(&'>'))
}

/// Parameter names when the parenthesis at `open` starts an arrow function.
fn arrow_params(chars: &[char], open: usize) -> Option<Vec<String>> {
    let close = matching_close(chars, open)?;
    if !arrow_follows(chars, close + 1) {
        return None;
    }
    let inner: String = chars[open + 1..close].iter().collect();
    Some(pattern_bindings(&inner))
}

/// Split a parameter list on the commas that are not nested in brackets.
#[must_use]
pub fn split_params(list: &str) -> Vec<String> {
    let chars: Vec<char> = list.chars().collect();
    let mut params = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\'' | '"' | '`' => {
                i = skip_string(&chars, i);
                continue;
            }
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                params.push(chars[start..i].iter().collect::<String>());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    params.push(chars[start..].iter().collect());
    params
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Names bound by a parameter pattern such as `{ id, meta: { tag } }`,
/// `[first, ...rest]` or `item = fallback`.
///
/// Object keys followed by `:` and default-value expressions bind nothing.
#[must_use]
pub fn pattern_bindings(pattern: &str) -> Vec<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut names = Vec::new();
    let mut brackets: Vec<char> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' | '`' => {
                i = skip_string(&chars, i);
                continue;
            }
            '(' | '[' | '{' => brackets.push(c),
            ')' | ']' | '}' => {
                brackets.pop();
            }
            '=' => {
                i = skip_default(&chars, i + 1);
                continue;
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_part(chars[i]) {
                    i += 1;
                }
                let is_key = brackets.last() == Some(&'{')
                    && next_significant(&chars, i).is_some_and(|k| chars[k] == ':');
                if !is_key {
                    names.push(chars[start..i].iter().collect());
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    names
}

/// Index just past a default-value expression starting at `from`.
fn skip_default(chars: &[char], from: usize) -> usize {
    let mut depth = 0usize;
    let mut i = from;
    while i < chars.len() {
        match chars[i] {
            '\'' | '"' | '`' => {
                i = skip_string(chars, i);
                continue;
            }
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' if depth == 0 => return i,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => return i,
            _ => {}
        }
        i += 1;
    }
    i
}

/// `foo`, `foo.bar`, `foo['bar']`: usable directly as an event handler.
#[must_use]
pub fn is_member_path(expr: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_$][\w$]*(?:\s*\.\s*[A-Za-z_$][\w$]*|\[[^\]]+\])*$")
            .expect("static regex is valid")
    })
    .is_match(expr.trim())
}

/// Arrow functions and `function` expressions.
#[must_use]
pub fn is_function_expression(expr: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:async\s+)?(?:[\w$]+|\([^)]*?\))\s*=>|^(?:async\s+)?function(?:\s+[\w$]+)?\s*\(")
            .expect("static regex is valid")
    })
    .is_match(expr.trim())
}
