//! Import specifier rewriting for unbundled dev serving.
//!
//! Bare specifiers (`vue`, `@vue/shared`) are rewritten to `/@modules/<name>`
//! so the browser sends them back to the package resolver. Relative (`./x`,
//! `../x`) and absolute (`/x`) specifiers are left untouched, which also
//! makes the rewrite idempotent: `/@modules/vue` starts with `/`.
//!
//! Specifiers are located on the syntax tree, so look-alikes inside strings
//! and comments are never touched.

use crate::error::Error;
use crate::js::{parse_module, splice};
use std::ops::Range;
use swc_ecma_ast::{CallExpr, Callee, ExportAll, Expr, ImportDecl, Lit, NamedExport, Str};
use swc_ecma_visit::{Visit, VisitWith};

/// URL prefix under which packages from the dependency store are served.
pub const MODULES_PREFIX: &str = "/@modules/";

/// Whether a specifier names a package rather than a file path.
#[must_use]
pub fn is_bare_specifier(specifier: &str) -> bool {
    !(specifier.starts_with('.') || specifier.starts_with('/'))
}

/// Rewrite every bare import specifier in `code` to `/@modules/<specifier>`.
///
/// Covers `import ... from`, side-effect `import '...'`, `export ... from`,
/// `export * from` and `import('...')` with a string literal argument. The
/// original quote character is kept. `file` only labels parse errors.
pub fn rewrite_imports(code: &str, file: &str) -> Result<String, Error> {
    let parsed = parse_module(code, file)?;

    let mut collector = SpecifierCollector::default();
    parsed.module.visit_with(&mut collector);

    let edits: Vec<(Range<usize>, String)> = collector
        .found
        .into_iter()
        .filter(|(_, specifier)| is_bare_specifier(specifier))
        .map(|(span, specifier)| {
            let range = parsed.range(span);
            let quote = code[range.start..].chars().next().unwrap_or('\'');
            (range, format!("{quote}{MODULES_PREFIX}{specifier}{quote}"))
        })
        .collect();

    if edits.is_empty() {
        return Ok(code.to_string());
    }
    Ok(splice(code, edits))
}

/// Collects the string literal of every module specifier in a module.
#[derive(Default)]
struct SpecifierCollector {
    found: Vec<(swc_common::Span, String)>,
}

impl SpecifierCollector {
    fn push(&mut self, src: &Str) {
        self.found.push((src.span, src.value.to_string()));
    }
}

impl Visit for SpecifierCollector {
    fn visit_import_decl(&mut self, n: &ImportDecl) {
        self.push(&n.src);
    }

    fn visit_named_export(&mut self, n: &NamedExport) {
        if let Some(src) = &n.src {
            self.push(src);
        }
    }

    fn visit_export_all(&mut self, n: &ExportAll) {
        self.push(&n.src);
    }

    fn visit_call_expr(&mut self, n: &CallExpr) {
        if let Callee::Import(_) = n.callee {
            if let Some(arg) = n.args.first() {
                if arg.spread.is_none() {
                    if let Expr::Lit(Lit::Str(src)) = &*arg.expr {
                        self.push(src);
                    }
                }
            }
        }
        n.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(code: &str) -> String {
        rewrite_imports(code, "test.js").unwrap()
    }

    #[test]
    fn test_rewrite_bare_specifier() {
        let code = r#"import { createApp } from 'vue';
import lodash from "lodash";"#;

        let result = rewrite(code);

        assert!(result.contains("from '/@modules/vue'"));
        assert!(result.contains("from \"/@modules/lodash\""));
    }

    #[test]
    fn test_relative_and_absolute_untouched() {
        let code = "import App from './App.vue';\nimport util from '../util.js';\nimport abs from '/src/abs.js';\n";
        assert_eq!(rewrite(code), code);
    }

    #[test]
    fn test_slash_prefixed_without_dot_is_absolute() {
        let code = "import x from '/x';";
        assert_eq!(rewrite(code), code);
    }

    #[test]
    fn test_scoped_and_subpath_specifiers() {
        let result = rewrite("import { h } from '@vue/runtime-dom';\nimport d from 'lodash-es/debounce';");
        assert!(result.contains("from '/@modules/@vue/runtime-dom'"));
        assert!(result.contains("from '/@modules/lodash-es/debounce'"));
    }

    #[test]
    fn test_rewrite_export_from() {
        let result = rewrite("export { foo } from 'bar';\nexport * from 'baz';");
        assert!(result.contains("from '/@modules/bar'"));
        assert!(result.contains("from '/@modules/baz'"));
    }

    #[test]
    fn test_rewrite_side_effect_and_dynamic() {
        let result = rewrite("import 'polyfill';\nconst m = () => import('chart');");
        assert!(result.contains("import '/@modules/polyfill'"));
        assert!(result.contains("import('/@modules/chart')"));
    }

    #[test]
    fn test_strings_and_comments_untouched() {
        let code = r#"// import x from 'vue'
const s = " from 'vue'";
/* export * from 'vue' */
"#;
        assert_eq!(rewrite(code), code);
    }

    #[test]
    fn test_rest_of_text_byte_identical() {
        let code = "import {ref}   from   'vue'  ;\n\n  const   x = ref( 1 )\n";
        let result = rewrite(code);
        assert_eq!(
            result,
            "import {ref}   from   '/@modules/vue'  ;\n\n  const   x = ref( 1 )\n"
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let code = "import { createApp } from 'vue';\nimport App from './App.vue';";
        let once = rewrite(code);
        let twice = rewrite(&once);
        assert_eq!(once, twice);
        assert!(!twice.contains("/@modules//@modules/"));
    }

    #[test]
    fn test_is_bare_specifier() {
        assert!(is_bare_specifier("vue"));
        assert!(is_bare_specifier("@vue/shared"));
        assert!(!is_bare_specifier("./App.vue"));
        assert!(!is_bare_specifier("../x"));
        assert!(!is_bare_specifier("/@modules/vue"));
        assert!(!is_bare_specifier(".hidden"));
    }

    #[test]
    fn test_parse_error_propagates() {
        let err = rewrite_imports("import from from from;", "bad.js").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
