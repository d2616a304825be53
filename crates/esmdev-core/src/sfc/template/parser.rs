//! Template markup to a node tree.

use crate::sfc::html::{decode_entities, parse_close_tag, parse_open_tag, Attr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Expression inside `{{ }}`, trimmed.
    Interpolation(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
}

impl Element {
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.name == name)
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[must_use]
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

/// Parse template markup into its root nodes.
///
/// Comments are dropped. Whitespace is condensed: whitespace-only text at the
/// edge of its parent, or spanning a newline between two elements, is
/// removed; other whitespace runs collapse to one space (except inside `<pre>`).
pub fn parse_template(src: &str) -> Result<Vec<Node>, String> {
    let mut stack: Vec<Element> = Vec::new();
    let mut roots: Vec<Node> = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    while i < src.len() {
        let rest = &src[i..];

        if rest.starts_with("{{") {
            let close = rest[2..]
                .find("}}")
                .ok_or_else(|| "unterminated interpolation `{{`".to_string())?;
            flush_text(&mut text, &mut stack, &mut roots);
            let expr = rest[2..2 + close].trim().to_string();
            push_node(Node::Interpolation(expr), &mut stack, &mut roots);
            i += 2 + close + 2;
            continue;
        }

        if rest.starts_with("<!--") {
            let close = rest.find("-->").ok_or_else(|| "unterminated comment".to_string())?;
            flush_text(&mut text, &mut stack, &mut roots);
            i += close + 3;
            continue;
        }

        if rest.starts_with("</") {
            let (name, after) =
                parse_close_tag(src, i).ok_or_else(|| "unterminated closing tag".to_string())?;
            flush_text(&mut text, &mut stack, &mut roots);
            let open = stack
                .pop()
                .ok_or_else(|| format!("unexpected closing tag </{name}>"))?;
            if !open.tag.eq_ignore_ascii_case(&name) {
                return Err(format!(
                    "mismatched closing tag: expected </{}>, found </{name}>",
                    open.tag
                ));
            }
            close_element(open, &mut stack, &mut roots);
            i = after;
            continue;
        }

        if rest.starts_with('<') {
            if let Some(tag) = parse_open_tag(src, i)? {
                flush_text(&mut text, &mut stack, &mut roots);
                let element = Element {
                    tag: tag.name,
                    attrs: tag.attrs,
                    children: Vec::new(),
                };
                if tag.self_closing || is_void_element(&element.tag) {
                    push_node(Node::Element(element), &mut stack, &mut roots);
                } else {
                    stack.push(element);
                }
                i = tag.end;
                continue;
            }
        }

        let ch = rest.chars().next().unwrap_or_default();
        text.push(ch);
        i += ch.len_utf8().max(1);
    }

    flush_text(&mut text, &mut stack, &mut roots);
    if let Some(open) = stack.last() {
        return Err(format!("unclosed element <{}>", open.tag));
    }

    condense(&mut roots, false);
    Ok(roots)
}

fn push_node(node: Node, stack: &mut [Element], roots: &mut Vec<Node>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

fn flush_text(text: &mut String, stack: &mut [Element], roots: &mut Vec<Node>) {
    if text.is_empty() {
        return;
    }
    let decoded = decode_entities(text);
    text.clear();
    push_node(Node::Text(decoded), stack, roots);
}

fn close_element(mut element: Element, stack: &mut [Element], roots: &mut Vec<Node>) {
    let preserve = element.tag.eq_ignore_ascii_case("pre");
    condense(&mut element.children, preserve);
    push_node(Node::Element(element), stack, roots);
}

fn condense(nodes: &mut Vec<Node>, preserve: bool) {
    if preserve {
        return;
    }
    let is_element = |i: usize| matches!(nodes.get(i), Some(Node::Element(_)));
    let last = nodes.len().saturating_sub(1);
    let drop: Vec<bool> = (0..nodes.len())
        .map(|i| match &nodes[i] {
            Node::Text(text) if text.chars().all(char::is_whitespace) => {
                i == 0
                    || i == last
                    || (text.contains('\n') && is_element(i - 1) && is_element(i + 1))
            }
            _ => false,
        })
        .collect();

    let mut index = 0;
    nodes.retain_mut(|node| {
        let keep = !drop[index];
        index += 1;
        if let Node::Text(text) = node {
            *text = collapse_whitespace(text);
        }
        keep
    });
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() && c != '\u{a0}' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &Node) -> &Element {
        match node {
            Node::Element(e) => e,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_interpolation_inside_element() {
        let nodes = parse_template("<div>{{msg}}</div>").unwrap();
        assert_eq!(nodes.len(), 1);
        let div = element(&nodes[0]);
        assert_eq!(div.tag, "div");
        assert_eq!(div.children, vec![Node::Interpolation("msg".into())]);
    }

    #[test]
    fn test_mixed_text_and_interpolation() {
        let nodes = parse_template("<p>Hello, {{ name }}!</p>").unwrap();
        assert_eq!(
            element(&nodes[0]).children,
            vec![
                Node::Text("Hello, ".into()),
                Node::Interpolation("name".into()),
                Node::Text("!".into()),
            ]
        );
    }

    #[test]
    fn test_whitespace_condensed() {
        let nodes = parse_template("\n  <ul>\n    <li>a   b</li>\n    <li>c</li>\n  </ul>\n").unwrap();
        assert_eq!(nodes.len(), 1);
        let ul = element(&nodes[0]);
        assert_eq!(ul.children.len(), 2);
        assert_eq!(element(&ul.children[0]).children, vec![Node::Text("a b".into())]);
    }

    #[test]
    fn test_inline_space_between_elements_kept() {
        let nodes = parse_template("<p><b>a</b> <i>b</i></p>").unwrap();
        let p = element(&nodes[0]);
        assert_eq!(p.children.len(), 3);
        assert_eq!(p.children[1], Node::Text(" ".into()));
    }

    #[test]
    fn test_newline_between_interpolations_becomes_space() {
        let nodes = parse_template("<p>{{ a }}\n  {{ b }}</p>").unwrap();
        assert_eq!(
            element(&nodes[0]).children,
            vec![
                Node::Interpolation("a".into()),
                Node::Text(" ".into()),
                Node::Interpolation("b".into()),
            ]
        );

        let nodes = parse_template("<p><b>x</b>\n{{ y }}</p>").unwrap();
        assert_eq!(element(&nodes[0]).children[1], Node::Text(" ".into()));
    }

    #[test]
    fn test_void_and_self_closing() {
        let nodes = parse_template("<div><input v-model=\"a\"><br/><Comp /></div>").unwrap();
        let div = element(&nodes[0]);
        assert_eq!(div.children.len(), 3);
        assert_eq!(element(&div.children[2]).tag, "Comp");
    }

    #[test]
    fn test_comments_dropped_and_entities_decoded() {
        let nodes = parse_template("<p><!-- note -->a &lt; b</p>").unwrap();
        assert_eq!(element(&nodes[0]).children, vec![Node::Text("a < b".into())]);
    }

    #[test]
    fn test_less_than_in_text() {
        let nodes = parse_template("<p>1 < 2</p>").unwrap();
        assert_eq!(element(&nodes[0]).children, vec![Node::Text("1 < 2".into())]);
    }

    #[test]
    fn test_multiple_roots() {
        let nodes = parse_template("<h1>a</h1>\n<p>b</p>").unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_errors() {
        assert!(parse_template("<div>{{ a </div>").unwrap_err().contains("interpolation"));
        assert!(parse_template("<div><p></div>").unwrap_err().contains("mismatched"));
        assert!(parse_template("<div>").unwrap_err().contains("unclosed"));
        assert!(parse_template("</div>").unwrap_err().contains("unexpected"));
    }

    #[test]
    fn test_pre_preserves_whitespace() {
        let nodes = parse_template("<pre>  a\n   b</pre>").unwrap();
        assert_eq!(element(&nodes[0]).children, vec![Node::Text("  a\n   b".into())]);
    }
}
