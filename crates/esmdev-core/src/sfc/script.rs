//! Logic-block compilation: binding the component options object to `__script`.
//!
//! A plain `<script>` block keeps its code and has its `export default`
//! turned into `const __script =`. A `<script setup>` block is wrapped into an
//! options object whose `setup()` returns every binding the block declares.

use crate::error::Error;
use crate::js::{parse_module, splice};
use swc_common::Spanned;
use swc_ecma_ast::{
    Decl, ExportSpecifier, ImportSpecifier, ModuleDecl, ModuleExportName, ModuleItem,
    NamedExport, ObjectPatProp, Pat, Stmt,
};

/// Name of the local binding that holds the component options object.
pub const SCRIPT_BINDING: &str = "__script";

/// Compile a plain `<script>` block.
pub fn compile_script(content: &str, file: &str) -> Result<String, Error> {
    let parsed = parse_module(content, file)?;

    let mut default_export = None;
    for item in &parsed.module.body {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(_))
            | ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(_)) => {
                default_export = Some(parsed.range(item.span()));
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(named)) if exports_default(named) => {
                return Err(Error::parse(
                    file,
                    "`export { ... as default }` is not supported; use `export default`",
                ));
            }
            _ => {}
        }
    }

    let Some(range) = default_export else {
        let mut code = content.to_string();
        if !code.ends_with('\n') {
            code.push('\n');
        }
        code.push_str(&format!("const {SCRIPT_BINDING} = {{}};\n"));
        return Ok(code);
    };

    let value = content[range.clone()]
        .strip_prefix("export")
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix("default"))
        .map(str::trim_start)
        .ok_or_else(|| Error::parse(file, "malformed `export default`"))?;

    let mut binding = format!("const {SCRIPT_BINDING} = {value}");
    if !binding.trim_end().ends_with(';') {
        binding.push(';');
    }

    let mut code = splice(content, vec![(range, binding)]);
    if !code.ends_with('\n') {
        code.push('\n');
    }
    Ok(code)
}

fn exports_default(named: &NamedExport) -> bool {
    named.src.is_none()
        && named.specifiers.iter().any(|s| match s {
            ExportSpecifier::Named(n) => matches!(
                &n.exported,
                Some(ModuleExportName::Ident(id)) if &*id.sym == "default"
            ),
            _ => false,
        })
}

/// Compile a `<script setup>` block.
///
/// Imports are hoisted to module scope; all other statements become the body
/// of `setup()`, which returns an object with every top-level binding.
pub fn compile_setup(content: &str, file: &str) -> Result<String, Error> {
    let parsed = parse_module(content, file)?;

    let mut imports = Vec::new();
    let mut removed = Vec::new();
    let mut bindings = Vec::new();

    for item in &parsed.module.body {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                let range = parsed.range(item.span());
                imports.push(content[range.clone()].trim_end().to_string());
                removed.push((range, String::new()));
                if !import.type_only {
                    for specifier in &import.specifiers {
                        let local = match specifier {
                            ImportSpecifier::Named(n) if n.is_type_only => continue,
                            ImportSpecifier::Named(n) => &n.local,
                            ImportSpecifier::Default(d) => &d.local,
                            ImportSpecifier::Namespace(ns) => &ns.local,
                        };
                        bindings.push(local.sym.to_string());
                    }
                }
            }
            ModuleItem::ModuleDecl(_) => {
                return Err(Error::parse(
                    file,
                    "export statements are not allowed in <script setup>",
                ));
            }
            ModuleItem::Stmt(stmt) => collect_stmt_bindings(stmt, &mut bindings),
        }
    }

    let mut seen = std::collections::HashSet::new();
    bindings.retain(|name| seen.insert(name.clone()));

    let body = splice(content, removed);
    let body = body.trim_matches(|c| c == '\n' || c == '\r');

    let mut code = String::new();
    for import in &imports {
        code.push_str(import);
        code.push('\n');
    }
    code.push_str(&format!("const {SCRIPT_BINDING} = {{\n  setup() {{\n"));
    if !body.trim().is_empty() {
        code.push_str(body);
        code.push('\n');
    }
    code.push_str(&format!("    return {{ {} }};\n  }}\n}};\n", bindings.join(", ")));
    Ok(code)
}

/// Names declared by a top-level statement.
fn collect_stmt_bindings(stmt: &Stmt, out: &mut Vec<String>) {
    let Stmt::Decl(decl) = stmt else {
        return;
    };
    match decl {
        Decl::Var(var) => {
            for declarator in &var.decls {
                collect_pat_bindings(&declarator.name, out);
            }
        }
        Decl::Fn(f) => out.push(f.ident.sym.to_string()),
        Decl::Class(c) => out.push(c.ident.sym.to_string()),
        _ => {}
    }
}

fn collect_pat_bindings(pat: &Pat, out: &mut Vec<String>) {
    match pat {
        Pat::Ident(binding) => out.push(binding.id.sym.to_string()),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                collect_pat_bindings(elem, out);
            }
        }
        Pat::Rest(rest) => collect_pat_bindings(&rest.arg, out),
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => collect_pat_bindings(&kv.value, out),
                    ObjectPatProp::Assign(assign) => out.push(assign.key.sym.to_string()),
                    ObjectPatProp::Rest(rest) => collect_pat_bindings(&rest.arg, out),
                }
            }
        }
        Pat::Assign(assign) => collect_pat_bindings(&assign.left, out),
        Pat::Expr(_) | Pat::Invalid(_) => {}
    }
}
