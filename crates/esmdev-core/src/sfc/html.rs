//! Markup tag scanning shared by the descriptor parser and the template parser.

/// An attribute as written: `name`, `name="value"`, `name='value'` or `name=value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: Option<String>,
}

/// A parsed opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTag {
    pub name: String,
    pub attrs: Vec<Attr>,
    pub self_closing: bool,
    /// Byte offset just past the closing `>`.
    pub end: usize,
}

fn is_tag_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

/// Case-insensitive ASCII prefix test at byte offset `at`.
pub(crate) fn starts_with_ignore_case(src: &str, at: usize, prefix: &str) -> bool {
    src.get(at..at + prefix.len())
        .is_some_and(|s| s.eq_ignore_ascii_case(prefix))
}

/// Parse an opening tag at `start`, which must point at `<`.
///
/// Returns `Ok(None)` when the `<` does not begin a tag (e.g. `a < b` in text).
pub fn parse_open_tag(src: &str, start: usize) -> Result<Option<OpenTag>, String> {
    let bytes = src.as_bytes();
    let len = bytes.len();
    let mut i = start + 1;

    if i >= len || !bytes[i].is_ascii_alphabetic() {
        return Ok(None);
    }
    let name_start = i;
    while i < len && is_tag_name_byte(bytes[i]) {
        i += 1;
    }
    let name = src[name_start..i].to_string();
    let mut attrs = Vec::new();

    loop {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            return Err(format!("unterminated <{name}> tag"));
        }

        match bytes[i] {
            b'>' => {
                return Ok(Some(OpenTag {
                    name,
                    attrs,
                    self_closing: false,
                    end: i + 1,
                }))
            }
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                return Ok(Some(OpenTag {
                    name,
                    attrs,
                    self_closing: true,
                    end: i + 2,
                }))
            }
            b'/' => i += 1,
            _ => {
                let attr_start = i;
                while i < len
                    && !bytes[i].is_ascii_whitespace()
                    && bytes[i] != b'='
                    && bytes[i] != b'>'
                    && !(bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>'))
                {
                    i += 1;
                }
                let attr_name = src[attr_start..i].to_string();

                let mut j = i;
                while j < len && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                if j < len && bytes[j] == b'=' {
                    j += 1;
                    while j < len && bytes[j].is_ascii_whitespace() {
                        j += 1;
                    }
                    let (value, next) = parse_attr_value(src, j)
                        .ok_or_else(|| format!("unterminated value for `{attr_name}` in <{name}>"))?;
                    attrs.push(Attr {
                        name: attr_name,
                        value: Some(value),
                    });
                    i = next;
                } else {
                    attrs.push(Attr {
                        name: attr_name,
                        value: None,
                    });
                }
            }
        }
    }
}

fn parse_attr_value(src: &str, at: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let quote = *bytes.get(at)?;
    if quote == b'"' || quote == b'\'' {
        let close = src[at + 1..].find(quote as char)? + at + 1;
        return Some((src[at + 1..close].to_string(), close + 1));
    }

    let mut end = at;
    while end < bytes.len() && !bytes[end].is_ascii_whitespace() && bytes[end] != b'>' {
        end += 1;
    }
    if end == at {
        return None;
    }
    Some((src[at..end].to_string(), end))
}

/// Parse a closing tag `</name>` at `start`. Returns the name and the offset past `>`.
pub fn parse_close_tag(src: &str, start: usize) -> Option<(String, usize)> {
    let rest = src.get(start..)?.strip_prefix("</")?;
    let close = rest.find('>')?;
    let name = rest[..close].trim().to_string();
    Some((name, start + 2 + close + 1))
}

/// Decode the handful of character references that appear in templates.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_open_tag_attrs() {
        let src = r#"<div id="app" class='a b' :title="msg" @click="go" disabled data-x=1>"#;
        let tag = parse_open_tag(src, 0).unwrap().unwrap();

        assert_eq!(tag.name, "div");
        assert!(!tag.self_closing);
        assert_eq!(tag.end, src.len());
        let names: Vec<_> = tag.attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["id", "class", ":title", "@click", "disabled", "data-x"]);
        assert_eq!(tag.attrs[1].value.as_deref(), Some("a b"));
        assert_eq!(tag.attrs[4].value, None);
        assert_eq!(tag.attrs[5].value.as_deref(), Some("1"));
    }

    #[test]
    fn test_parse_open_tag_self_closing() {
        let tag = parse_open_tag("<my-comp :a=\"1\" />rest", 0).unwrap().unwrap();
        assert_eq!(tag.name, "my-comp");
        assert!(tag.self_closing);
        assert_eq!(tag.end, 18);
    }

    #[test]
    fn test_value_with_gt_and_slash() {
        let tag = parse_open_tag(r#"<a :href="'/x/' + (a > b)">"#, 0).unwrap().unwrap();
        assert_eq!(tag.attrs[0].value.as_deref(), Some("'/x/' + (a > b)"));
    }

    #[test]
    fn test_not_a_tag() {
        assert_eq!(parse_open_tag("< 3", 0).unwrap(), None);
        assert_eq!(parse_open_tag("<", 0).unwrap(), None);
    }

    #[test]
    fn test_unterminated_tag() {
        assert!(parse_open_tag("<div class=\"a", 0).is_err());
        assert!(parse_open_tag("<div", 0).is_err());
    }

    #[test]
    fn test_parse_close_tag() {
        assert_eq!(
            parse_close_tag("</template >x", 0),
            Some(("template".to_string(), 12))
        );
        assert_eq!(parse_close_tag("<div>", 0), None);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt; b &amp;&amp; c"), "a < b && c");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }
}
