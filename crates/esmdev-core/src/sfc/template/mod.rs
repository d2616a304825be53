//! Template block compilation into a render function module.

pub mod codegen;
pub mod expr;
pub mod parser;

use crate::error::Error;
use codegen::Codegen;
use parser::parse_template;

/// Compile template markup into an ES module exporting `render`.
pub fn compile_template(source: &str, file: &str) -> Result<String, Error> {
    let roots = parse_template(source).map_err(|message| Error::parse(file, message))?;
    Codegen::new()
        .generate(&roots)
        .map_err(|message| Error::parse(file, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::parse_module;

    fn compile(src: &str) -> String {
        let code = compile_template(src, "T.vue").unwrap();
        assert!(
            parse_module(&code, "render.js").is_ok(),
            "generated code does not parse:\n{code}"
        );
        code
    }

    #[test]
    fn test_interpolation() {
        assert_eq!(
            compile("<div>{{msg}}</div>"),
            "import { createVNode as _createVNode, toDisplayString as _toDisplayString } from \"vue\"\n\n\
             export function render(_ctx, _cache) {\n  \
             return _createVNode(\"div\", null, _toDisplayString(_ctx.msg))\n}\n"
        );
    }

    #[test]
    fn test_static_and_bound_attributes() {
        let code = compile(r#"<a class="link" :class="{ active: on }" :href="url" title="x &amp; y">go</a>"#);
        assert!(code.contains(r#"href: _ctx.url"#));
        assert!(code.contains(r#"title: "x & y""#));
        assert!(code.contains(r#"class: ["link", { active: _ctx.on }]"#));
        assert!(code.contains(r#", "go")"#));
    }

    #[test]
    fn test_events() {
        let code = compile(r#"<button @click="count++" @submit.prevent="save" v-on:my-event="e => log(e)">+</button>"#);
        assert!(code.contains("onClick: $event => (_ctx.count++)"));
        assert!(code.contains(r#"onSubmit: _withModifiers(_ctx.save, ["prevent"])"#));
        assert!(code.contains("onMyEvent: e => _ctx.log(e)"));
    }

    #[test]
    fn test_key_modifiers() {
        let code = compile(r#"<input @keyup.enter="submit">"#);
        assert!(code.contains(r#"onKeyup: _withKeys(_ctx.submit, ["enter"])"#));
    }

    #[test]
    fn test_v_if_chain() {
        let code = compile("<div><p v-if=\"a\">A</p>\n<p v-else-if=\"b\">B</p>\n<p v-else>C</p></div>");
        assert!(code.contains(
            r#"(_ctx.a) ? _createVNode("p", null, "A") : (_ctx.b) ? _createVNode("p", null, "B") : _createVNode("p", null, "C")"#
        ));
    }

    #[test]
    fn test_v_if_without_else_renders_comment() {
        let code = compile("<p v-if=\"show\">hi</p>");
        assert!(code.contains(r#": _createCommentVNode("v-if", true)"#));
    }

    #[test]
    fn test_v_for_scopes_aliases() {
        let code = compile(r#"<ul><li v-for="(item, i) in items" :key="item.id">{{ i }}: {{ item.name }}</li></ul>"#);
        assert!(code.contains("_renderList(_ctx.items, (item, i) => {"));
        assert!(code.contains("key: item.id"));
        assert!(code.contains(r#"_toDisplayString(i) + ": " + _toDisplayString(item.name)"#));
        assert!(!code.contains("_ctx.item.") && !code.contains("_ctx.i)"));
    }

    #[test]
    fn test_v_for_destructured_aliases() {
        let code = compile(r#"<ul><li v-for="({ id, name }, index) in items" :key="id">{{ name }}</li></ul>"#);
        assert!(code.contains("_renderList(_ctx.items, ({ id, name }, index) => {"));
        assert!(code.contains("key: id"));
        assert!(code.contains("_toDisplayString(name)"));
        assert!(!code.contains("_ctx.name") && !code.contains("_ctx.id"));
    }

    #[test]
    fn test_newline_between_interpolations_renders_space() {
        let code = compile("<p>{{ a }}\n{{ b }}</p>");
        assert!(code.contains(r#"_toDisplayString(_ctx.a) + " " + _toDisplayString(_ctx.b)"#));
    }

    #[test]
    fn test_components_and_default_slot() {
        let code = compile(r#"<MyButton :size="s" @click="go">Save {{ label }}</MyButton>"#);
        assert!(code.contains(r#"const _component_MyButton = _resolveComponent("MyButton")"#));
        assert!(code.contains("_createVNode(_component_MyButton, { size: _ctx.s, onClick: _ctx.go }, { default: _withCtx(() => ["));
        assert!(code.contains("import { createTextVNode as _createTextVNode, createVNode as _createVNode, resolveComponent as _resolveComponent"));
    }

    #[test]
    fn test_slot_outlet() {
        let code = compile(r#"<div><slot name="header">Default</slot></div>"#);
        assert!(code.contains(r#"_renderSlot(_ctx.$slots, "header", {}, () => [_createTextVNode("Default")])"#));
    }

    #[test]
    fn test_v_model() {
        let code = compile(r#"<form><input v-model="name"><input type="checkbox" v-model="agree"><select v-model.number="n"></select><Field v-model="x" /></form>"#);
        assert!(code.contains("value: _ctx.name, onInput: $event => (_ctx.name = $event.target.value)"));
        assert!(code.contains("checked: _ctx.agree, onChange: $event => (_ctx.agree = $event.target.checked)"));
        assert!(code.contains("onChange: $event => (_ctx.n = Number($event.target.value))"));
        assert!(code.contains(r#""onUpdate:modelValue": $event => (_ctx.x = $event)"#));
    }

    #[test]
    fn test_v_show_html_text() {
        let code = compile(r#"<div><p v-show="visible">x</p><div v-html="raw"></div><span v-text="t"></span></div>"#);
        assert!(code.contains(r#"_withDirectives(_createVNode("p", null, "x"), [[_vShow, _ctx.visible]])"#));
        assert!(code.contains(r#"_createVNode("div", { innerHTML: _ctx.raw })"#));
        assert!(code.contains("textContent: _toDisplayString(_ctx.t)"));
    }

    #[test]
    fn test_multiple_roots_use_fragment() {
        let code = compile("<h1>a</h1>\n<p>b</p>");
        assert!(code.contains("return _createVNode(_Fragment, null, ["));
    }

    #[test]
    fn test_empty_template_renders_null() {
        assert!(compile("\n").contains("return null"));
    }

    #[test]
    fn test_template_change_changes_output() {
        assert_ne!(compile("<div>{{ a }}</div>"), compile("<div>{{ b }}</div>"));
    }

    #[test]
    fn test_errors() {
        for bad in [
            "<div>",
            "<div>{{ x </div>",
            "<p v-else>x</p>",
            "<Comp #header>x</Comp>",
            "<p v-custom=\"x\"></p>",
            "<li v-for=\"items\"></li>",
        ] {
            let err = compile_template(bad, "Bad.vue").unwrap_err();
            assert!(matches!(err, Error::Parse { .. }), "{bad}: {err}");
        }
    }
}
