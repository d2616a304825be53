//! Splitting a single-file component into its top-level blocks.

use super::html::{parse_close_tag, parse_open_tag, starts_with_ignore_case, Attr, OpenTag};
use crate::error::Error;

/// One top-level block of a component file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfcBlock {
    /// Raw text between the opening and closing tags.
    pub content: String,
    pub attrs: Vec<Attr>,
}

impl SfcBlock {
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    #[must_use]
    pub fn lang(&self) -> Option<&str> {
        self.attr("lang")
    }
}

/// Parsed component: at most one template, one plain script and one setup script,
/// plus any number of style blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SfcDescriptor {
    pub template: Option<SfcBlock>,
    pub script: Option<SfcBlock>,
    pub script_setup: Option<SfcBlock>,
    pub styles: Vec<SfcBlock>,
}

/// The block that supplies the component's logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicBlock<'a> {
    Script(&'a SfcBlock),
    Setup(&'a SfcBlock),
}

impl SfcDescriptor {
    /// The live logic block: a plain `<script>` wins over `<script setup>`.
    #[must_use]
    pub fn logic(&self) -> Option<LogicBlock<'_>> {
        self.script
            .as_ref()
            .map(LogicBlock::Script)
            .or_else(|| self.script_setup.as_ref().map(LogicBlock::Setup))
    }
}

/// Parse component source into a descriptor. `file` labels errors.
pub fn parse_descriptor(source: &str, file: &str) -> Result<SfcDescriptor, Error> {
    let err = |message: String| Error::parse(file, message);
    let mut descriptor = SfcDescriptor::default();
    let mut i = 0;

    while let Some(offset) = source[i..].find('<') {
        let at = i + offset;

        if source[at..].starts_with("<!--") {
            let close = source[at..]
                .find("-->")
                .ok_or_else(|| err("unterminated comment".into()))?;
            i = at + close + 3;
            continue;
        }
        if source[at..].starts_with("</") {
            let (name, _) =
                parse_close_tag(source, at).ok_or_else(|| err("unterminated closing tag".into()))?;
            return Err(err(format!("unexpected </{name}> at top level")));
        }

        let Some(tag) = parse_open_tag(source, at).map_err(err)? else {
            i = at + 1;
            continue;
        };

        let name = tag.name.to_ascii_lowercase();
        let (content, next) = if tag.self_closing {
            (String::new(), tag.end)
        } else {
            let nested = name == "template";
            let (content_end, after) = find_block_end(source, tag.end, &name, nested)
                .ok_or_else(|| err(format!("unclosed <{name}> block")))?;
            (source[tag.end..content_end].to_string(), after)
        };
        i = next;

        let block = SfcBlock {
            content,
            attrs: tag.attrs.clone(),
        };
        match name.as_str() {
            "template" => {
                check_lang(&tag, &["html"]).map_err(err)?;
                set_once(&mut descriptor.template, block, "<template>").map_err(err)?;
            }
            "script" => {
                check_lang(&tag, &["js", "javascript", "mjs"]).map_err(err)?;
                if block.has_attr("setup") {
                    set_once(&mut descriptor.script_setup, block, "<script setup>").map_err(err)?;
                } else {
                    set_once(&mut descriptor.script, block, "<script>").map_err(err)?;
                }
            }
            "style" => {
                check_lang(&tag, &["css"]).map_err(err)?;
                descriptor.styles.push(block);
            }
            // Custom blocks (<i18n>, <docs>, ...) are skipped.
            _ => {}
        }
    }

    Ok(descriptor)
}

fn set_once(slot: &mut Option<SfcBlock>, block: SfcBlock, what: &str) -> Result<(), String> {
    if slot.is_some() {
        return Err(format!("a component may contain only one {what} block"));
    }
    *slot = Some(block);
    Ok(())
}

fn check_lang(tag: &OpenTag, supported: &[&str]) -> Result<(), String> {
    match tag.attrs.iter().find(|a| a.name == "lang") {
        Some(Attr {
            value: Some(lang), ..
        }) if !supported.contains(&lang.as_str()) => Err(format!(
            "lang=\"{lang}\" is not supported on <{}>",
            tag.name
        )),
        _ => Ok(()),
    }
}

/// Find the closing tag of a block whose content starts at `from`.
///
/// Returns the end of the content and the offset past the closing tag. With
/// `nested`, same-named tags inside the block are balanced (templates may
/// contain `<template v-if>`); otherwise the content is raw text.
fn find_block_end(src: &str, from: usize, name: &str, nested: bool) -> Option<(usize, usize)> {
    let close_prefix = format!("</{name}");
    let open_prefix = format!("<{name}");
    let mut depth = 0usize;
    let mut i = from;

    while let Some(offset) = src[i..].find('<') {
        let at = i + offset;

        if nested && src[at..].starts_with("<!--") {
            i = at + src[at..].find("-->").map_or(4, |c| c + 3);
            continue;
        }
        if starts_with_ignore_case(src, at, &close_prefix) && is_name_end(src, at + close_prefix.len())
        {
            let (_, after) = parse_close_tag(src, at)?;
            if depth == 0 {
                return Some((at, after));
            }
            depth -= 1;
            i = after;
            continue;
        }
        if nested
            && starts_with_ignore_case(src, at, &open_prefix)
            && is_name_end(src, at + open_prefix.len())
        {
            if let Ok(Some(tag)) = parse_open_tag(src, at) {
                if !tag.self_closing {
                    depth += 1;
                }
                i = tag.end;
                continue;
            }
        }
        i = at + 1;
    }
    None
}

fn is_name_end(src: &str, at: usize) -> bool {
    src.as_bytes()
        .get(at)
        .is_some_and(|b| b.is_ascii_whitespace() || *b == b'>' || *b == b'/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> SfcDescriptor {
        parse_descriptor(src, "Test.vue").unwrap()
    }

    #[test]
    fn test_script_and_template() {
        let d = parse(
            "<script>export default { data(){ return {msg:'hi'} } }</script><template><div>{{msg}}</div></template>",
        );
        assert_eq!(
            d.script.as_ref().unwrap().content,
            "export default { data(){ return {msg:'hi'} } }"
        );
        assert_eq!(d.template.as_ref().unwrap().content, "<div>{{msg}}</div>");
        assert!(d.script_setup.is_none());
        assert!(matches!(d.logic(), Some(LogicBlock::Script(_))));
    }

    #[test]
    fn test_script_preferred_over_setup() {
        let d = parse("<script setup>const a = 1</script>\n<script>export default {}</script>");
        assert!(d.script_setup.is_some());
        match d.logic() {
            Some(LogicBlock::Script(block)) => assert_eq!(block.content, "export default {}"),
            other => panic!("expected plain script, got {other:?}"),
        }
    }

    #[test]
    fn test_setup_only() {
        let d = parse("<script setup>\nconst a = 1\n</script>");
        assert!(matches!(d.logic(), Some(LogicBlock::Setup(_))));
    }

    #[test]
    fn test_nested_templates_balanced() {
        let d = parse(
            "<template><div><template v-if=\"ok\"><p>a</p></template><br/></div></template>\n<style>p{}</style>",
        );
        assert_eq!(
            d.template.unwrap().content,
            "<div><template v-if=\"ok\"><p>a</p></template><br/></div>"
        );
        assert_eq!(d.styles.len(), 1);
    }

    #[test]
    fn test_script_content_is_raw() {
        let d = parse("<script>const s = '<template>'; if (a < b) {}</script>");
        assert_eq!(
            d.script.unwrap().content,
            "const s = '<template>'; if (a < b) {}"
        );
    }

    #[test]
    fn test_styles_and_attrs() {
        let d = parse("<style scoped>a{}</style><style lang=\"css\">b{}</style>");
        assert_eq!(d.styles.len(), 2);
        assert!(d.styles[0].has_attr("scoped"));
        assert_eq!(d.styles[1].lang(), Some("css"));
    }

    #[test]
    fn test_comments_and_custom_blocks_skipped() {
        let d = parse("<!-- <script>nope</script> -->\n<docs>\n# Title\n</docs>\n<template><p/></template>");
        assert!(d.script.is_none());
        assert_eq!(d.template.unwrap().content, "<p/>");
    }

    #[test]
    fn test_unclosed_block_is_error() {
        let err = parse_descriptor("<template><div></div>", "Bad.vue").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("unclosed <template>"));
    }

    #[test]
    fn test_duplicate_block_is_error() {
        assert!(parse_descriptor("<script></script><script></script>", "Dup.vue").is_err());
        assert!(parse_descriptor("<template></template><template></template>", "Dup.vue").is_err());
    }

    #[test]
    fn test_unsupported_lang_is_error() {
        let err = parse_descriptor("<script lang=\"ts\">let a: number = 1</script>", "Ts.vue")
            .unwrap_err();
        assert!(err.to_string().contains("lang=\"ts\""));
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(parse(""), SfcDescriptor::default());
    }
}
