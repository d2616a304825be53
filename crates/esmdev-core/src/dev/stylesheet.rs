//! Stylesheets served as JavaScript modules.
//!
//! Importing `style.css` from a module evaluates code that appends a
//! `<style>` element with the stylesheet text and default-exports that text.

use crate::js::string_literal;

/// The stylesheet text as served: newline characters removed, nothing else changed.
#[must_use]
pub fn flatten(css: &str) -> String {
    css.replace('\n', "")
}

/// Wrap stylesheet text in a style-injecting ES module.
#[must_use]
pub fn wrap_stylesheet(css: &str) -> String {
    let literal = string_literal(&flatten(css));
    format!(
        "const css = {literal};\n{}export default css;\n",
        inject_style("style", "css")
    )
}

/// Statements that append a `<style>` element named `var` whose text is the
/// JavaScript expression `text`.
#[must_use]
pub fn inject_style(var: &str, text: &str) -> String {
    format!(
        "const {var} = document.createElement('style');\n\
         {var}.setAttribute('type', 'text/css');\n\
         {var}.textContent = {text};\n\
         document.head.appendChild({var});\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_stylesheet() {
        let module = wrap_stylesheet("body { color: red; }\n");

        assert!(module.contains(r#"const css = "body { color: red; }";"#));
        assert!(module.contains("document.createElement('style')"));
        assert!(module.contains("document.head.appendChild(style)"));
        assert!(module.contains("export default css"));
        assert_eq!(module.matches("appendChild").count(), 1);
    }

    #[test]
    fn test_newlines_removed_only() {
        assert_eq!(flatten("a {\n  b: c;\n}\n"), "a {  b: c;}");
        assert_eq!(flatten("a { b: c; }"), "a { b: c; }");
    }

    #[test]
    fn test_quotes_and_backslashes_escaped() {
        let css = "a::before { content: '\\201C'; font-family: \"Open Sans\"; }\n";
        let module = wrap_stylesheet(css);

        assert!(module.contains(
            r#"const css = "a::before { content: \'\\201C\'; font-family: \"Open Sans\"; }";"#
        ));
    }

    #[test]
    fn test_carriage_return_escaped() {
        let module = wrap_stylesheet("a {}\r\nb {}");
        assert!(module.contains(r#"const css = "a {}\rb {}";"#));
    }

    #[test]
    fn test_output_parses_as_module() {
        let module = wrap_stylesheet("q { quotes: \"'\" '\"'; }\n/* \\ */\n");
        assert!(crate::js::parse_module(&module, "style.css").is_ok());
    }
}
