//! The entry HTML document with its environment shim.
//!
//! Library code written for bundlers reads `process.env.NODE_ENV`. Browsers
//! have no `process`, so a tiny global is defined before any other script runs.

use crate::js::string_literal;
use regex_lite::Regex;
use std::ops::Range;
use std::sync::OnceLock;

fn script_open_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<script\b").expect("static regex is valid"))
}

fn head_close_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</head\s*>").expect("static regex is valid"))
}

/// Byte ranges of `<!-- ... -->` comments. An unterminated comment runs to
/// the end of the document.
fn comment_ranges(html: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut from = 0;
    while let Some(open) = html[from..].find("<!--").map(|i| from + i) {
        let end = html[open + 4..]
            .find("-->")
            .map_or(html.len(), |i| open + 4 + i + 3);
        ranges.push(open..end);
        from = end;
    }
    ranges
}

/// Start of the first match of `re` that is not inside a comment.
fn find_outside_comments(re: &Regex, html: &str, comments: &[Range<usize>]) -> Option<usize> {
    re.find_iter(html)
        .map(|m| m.start())
        .find(|at| !comments.iter().any(|c| c.contains(at)))
}

/// The script block defining `process.env.NODE_ENV` as `mode`.
#[must_use]
pub fn env_shim(mode: &str) -> String {
    format!(
        "<script>\n  window.process = {{ env: {{ NODE_ENV: {} }} }};\n</script>\n",
        string_literal(mode)
    )
}

/// Insert the environment shim immediately before the first `<script` tag.
/// Tags inside HTML comments are not considered.
///
/// Documents without scripts get the shim before `</head>`, or at the very
/// start if there is no head either.
#[must_use]
pub fn inject_env_shim(html: &str, mode: &str) -> String {
    let comments = comment_ranges(html);
    let at = find_outside_comments(script_open_tag(), html, &comments)
        .or_else(|| find_outside_comments(head_close_tag(), html, &comments))
        .unwrap_or(0);

    let shim = env_shim(mode);
    let mut out = String::with_capacity(html.len() + shim.len());
    out.push_str(&html[..at]);
    out.push_str(&shim);
    out.push_str(&html[at..]);
    out
}
