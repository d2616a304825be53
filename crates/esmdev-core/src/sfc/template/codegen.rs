//! Render function generation.
//!
//! The generated module imports its runtime helpers from `vue` under
//! underscore-prefixed local names and exports `render(_ctx, _cache)`, which
//! returns a vnode tree built with `createVNode`.

use super::expr::{
    is_function_expression, is_member_path, pattern_bindings, prefix_identifiers, split_params,
};
use super::parser::{Element, Node};
use crate::js::string_literal;
use crate::sfc::html::{decode_entities, Attr};
use std::collections::BTreeSet;

/// Module the render helpers are imported from.
pub const RUNTIME_MODULE: &str = "vue";

type GenResult = Result<String, String>;

#[derive(Default)]
pub struct Codegen {
    helpers: BTreeSet<&'static str>,
    components: Vec<String>,
}

impl Codegen {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the full render module for the template's root nodes.
    pub fn generate(mut self, roots: &[Node]) -> GenResult {
        let mut children = self.children(roots, &[])?;
        let root = match children.len() {
            0 => "null".to_string(),
            1 => children.remove(0),
            _ => {
                let fragment = self.helper("Fragment");
                let create = self.helper("createVNode");
                format!("{create}({fragment}, null, [\n    {}\n  ])", children.join(",\n    "))
            }
        };

        let mut code = String::new();
        if !self.helpers.is_empty() {
            let imports: Vec<String> = self
                .helpers
                .iter()
                .map(|h| format!("{h} as _{h}"))
                .collect();
            code.push_str(&format!(
                "import {{ {} }} from {}\n\n",
                imports.join(", "),
                string_literal(RUNTIME_MODULE)
            ));
        }
        code.push_str("export function render(_ctx, _cache) {\n");
        for name in &self.components {
            code.push_str(&format!(
                "  const {} = _resolveComponent({})\n",
                component_var(name),
                string_literal(name)
            ));
        }
        code.push_str(&format!("  return {root}\n}}\n"));
        Ok(code)
    }

    fn helper(&mut self, name: &'static str) -> String {
        self.helpers.insert(name);
        format!("_{name}")
    }

    /// Generate the expressions for a list of sibling nodes, folding
    /// `v-if`/`v-else-if`/`v-else` chains into conditionals.
    fn children(&mut self, nodes: &[Node], scope: &[String]) -> Result<Vec<String>, String> {
        let mut out = Vec::new();
        let mut i = 0;

        while i < nodes.len() {
            match &nodes[i] {
                Node::Text(text) => {
                    let create = self.helper("createTextVNode");
                    out.push(format!("{create}({})", string_literal(text)));
                }
                Node::Interpolation(expr) => {
                    let create = self.helper("createTextVNode");
                    let display = self.display(expr, scope);
                    out.push(format!("{create}({display})"));
                }
                Node::Element(el) => {
                    if el.attr("v-else").is_some() || el.attr("v-else-if").is_some() {
                        return Err(format!(
                            "v-else/v-else-if on <{}> has no adjacent v-if",
                            el.tag
                        ));
                    }
                    if let Some(cond) = directive_value(el, "v-if") {
                        let mut branches = vec![(Some(cond), el)];
                        let mut j = i + 1;
                        while j < nodes.len() {
                            match &nodes[j] {
                                Node::Text(t) if t.trim().is_empty() => j += 1,
                                Node::Element(next) if next.attr("v-else-if").is_some() => {
                                    branches.push((directive_value(next, "v-else-if"), next));
                                    j += 1;
                                }
                                Node::Element(next) if next.attr("v-else").is_some() => {
                                    branches.push((None, next));
                                    j += 1;
                                    break;
                                }
                                _ => break,
                            }
                        }
                        out.push(self.conditional(&branches, scope)?);
                        i = j;
                        continue;
                    }
                    out.push(self.element_with_for(el, scope)?);
                }
            }
            i += 1;
        }
        Ok(out)
    }

    fn conditional(
        &mut self,
        branches: &[(Option<String>, &Element)],
        scope: &[String],
    ) -> GenResult {
        let mut code = String::new();
        let mut has_else = false;
        for (cond, el) in branches {
            let node = self.element_with_for(el, scope)?;
            match cond {
                Some(cond) => {
                    code.push_str(&format!("({}) ? {node} : ", prefix_identifiers(cond, scope)));
                }
                None => {
                    code.push_str(&node);
                    has_else = true;
                }
            }
        }
        if !has_else {
            let comment = self.helper("createCommentVNode");
            code.push_str(&format!("{comment}(\"v-if\", true)"));
        }
        Ok(code)
    }

    fn element_with_for(&mut self, el: &Element, scope: &[String]) -> GenResult {
        let Some(source) = directive_value(el, "v-for") else {
            return self.element(el, scope);
        };
        let (aliases, list) =
            parse_for(&source).ok_or_else(|| format!("invalid v-for expression `{source}`"))?;

        let mut inner_scope = scope.to_vec();
        inner_scope.extend(aliases.iter().flat_map(|a| pattern_bindings(a)));
        let body = self.element(el, &inner_scope)?;

        let create = self.helper("createVNode");
        let fragment = self.helper("Fragment");
        let render_list = self.helper("renderList");
        Ok(format!(
            "{create}({fragment}, null, {render_list}({}, ({}) => {{\n      return {body}\n    }}))",
            prefix_identifiers(&list, scope),
            aliases.join(", ")
        ))
    }

    fn element(&mut self, el: &Element, scope: &[String]) -> GenResult {
        match el.tag.as_str() {
            "template" => self.template_fragment(el, scope),
            "slot" => self.slot(el, scope),
            _ => self.vnode(el, scope),
        }
    }

    fn template_fragment(&mut self, el: &Element, scope: &[String]) -> GenResult {
        reject_slot_directive(el)?;
        let children = self.children(&el.children, scope)?;
        let create = self.helper("createVNode");
        let fragment = self.helper("Fragment");
        Ok(format!("{create}({fragment}, null, [{}])", children.join(", ")))
    }

    fn slot(&mut self, el: &Element, scope: &[String]) -> GenResult {
        let name = el
            .attr("name")
            .and_then(|a| a.value.clone())
            .unwrap_or_else(|| "default".to_string());
        let props: Vec<&Attr> = el.attrs.iter().filter(|a| a.name != "name").collect();
        let props = self.props_object(&props, el, scope)?;

        let render_slot = self.helper("renderSlot");
        let mut code = format!(
            "{render_slot}(_ctx.$slots, {}, {})",
            string_literal(&name),
            props.unwrap_or_else(|| "{}".to_string())
        );
        if !el.children.is_empty() {
            let fallback = self.children(&el.children, scope)?;
            code.insert_str(code.len() - 1, &format!(", () => [{}]", fallback.join(", ")));
        }
        Ok(code)
    }

    fn vnode(&mut self, el: &Element, scope: &[String]) -> GenResult {
        reject_slot_directive(el)?;
        let component = is_component(&el.tag);

        let tag = if el.tag == "component" {
            let is = el
                .attrs
                .iter()
                .find(|a| a.name == ":is" || a.name == "v-bind:is")
                .and_then(|a| a.value.clone())
                .ok_or_else(|| "<component> requires a `:is` binding".to_string())?;
            let resolve = self.helper("resolveDynamicComponent");
            format!("{resolve}({})", prefix_identifiers(&is, scope))
        } else if component {
            self.helper("resolveComponent");
            if !self.components.contains(&el.tag) {
                self.components.push(el.tag.clone());
            }
            component_var(&el.tag)
        } else {
            string_literal(&el.tag)
        };

        let attrs: Vec<&Attr> = el
            .attrs
            .iter()
            .filter(|a| !(el.tag == "component" && (a.name == ":is" || a.name == "v-bind:is")))
            .collect();
        let props = self.props_object(&attrs, el, scope)?;

        let replaces_children = el.attr("v-html").is_some() || el.attr("v-text").is_some();
        let children = if replaces_children || el.children.is_empty() {
            None
        } else if component {
            let nodes = self.children(&el.children, scope)?;
            let with_ctx = self.helper("withCtx");
            Some(format!(
                "{{ default: {with_ctx}(() => [{}]) }}",
                nodes.join(", ")
            ))
        } else if el
            .children
            .iter()
            .all(|n| matches!(n, Node::Text(_) | Node::Interpolation(_)))
        {
            Some(self.text_children(&el.children, scope))
        } else {
            let nodes = self.children(&el.children, scope)?;
            Some(format!("[\n      {}\n    ]", nodes.join(",\n      ")))
        };

        let create = self.helper("createVNode");
        let mut args = vec![tag];
        match (props, children) {
            (None, None) => {}
            (Some(props), None) => args.push(props),
            (props, Some(children)) => {
                args.push(props.unwrap_or_else(|| "null".to_string()));
                args.push(children);
            }
        }
        let mut code = format!("{create}({})", args.join(", "));

        if let Some(show) = directive_value(el, "v-show") {
            let with_directives = self.helper("withDirectives");
            let v_show = self.helper("vShow");
            code = format!(
                "{with_directives}({code}, [[{v_show}, {}]])",
                prefix_identifiers(&show, scope)
            );
        }
        Ok(code)
    }

    /// Text-only children as a single string expression.
    fn text_children(&mut self, nodes: &[Node], scope: &[String]) -> String {
        let parts: Vec<String> = nodes
            .iter()
            .map(|n| match n {
                Node::Text(t) => string_literal(t),
                Node::Interpolation(e) => self.display(e, scope),
                Node::Element(_) => String::new(),
            })
            .collect();
        parts.join(" + ")
    }

    fn display(&mut self, expr: &str, scope: &[String]) -> String {
        let to_display = self.helper("toDisplayString");
        format!("{to_display}({})", prefix_identifiers(expr, scope))
    }

    /// Build the props object for an element. `None` when it has no props.
    fn props_object(
        &mut self,
        attrs: &[&Attr],
        el: &Element,
        scope: &[String],
    ) -> Result<Option<String>, String> {
        let mut entries: Vec<String> = Vec::new();
        let mut classes: Vec<String> = Vec::new();
        let mut styles: Vec<String> = Vec::new();
        let mut spreads: Vec<String> = Vec::new();

        for attr in attrs {
            let name = attr.name.as_str();
            let value = attr.value.as_deref().unwrap_or("");

            if let Some(arg) = bind_arg(name) {
                let (arg, modifiers) = split_modifiers(arg);
                if arg.is_empty() {
                    spreads.push(prefix_identifiers(value, scope));
                    continue;
                }
                let expr = prefix_identifiers(value, scope);
                match arg {
                    "class" => classes.push(expr),
                    "style" => styles.push(expr),
                    _ => {
                        let key = if modifiers.contains(&"camel") {
                            camelize(arg)
                        } else {
                            arg.to_string()
                        };
                        entries.push(format!("{}: {expr}", self.prop_key(&key, scope)));
                    }
                }
                continue;
            }

            if let Some(arg) = on_arg(name) {
                let (event, modifiers) = split_modifiers(arg);
                entries.push(self.event_handler(event, &modifiers, value, scope)?);
                continue;
            }

            match name {
                "v-if" | "v-else-if" | "v-else" | "v-for" | "v-show" | "v-cloak" | "v-once" => {}
                "v-html" => entries.push(format!("innerHTML: {}", prefix_identifiers(value, scope))),
                "v-text" => entries.push(format!(
                    "textContent: {}",
                    self.display(value, scope)
                )),
                _ if name == "v-model" || name.starts_with("v-model.") => {
                    let (_, modifiers) = split_modifiers(name);
                    entries.extend(self.model(el, value, &modifiers, scope));
                }
                _ if name.starts_with("v-") => {
                    return Err(format!("unsupported directive `{name}` on <{}>", el.tag));
                }
                "class" => classes.insert(0, string_literal(&decode_entities(value))),
                "style" => styles.insert(0, string_literal(&decode_entities(value))),
                _ => entries.push(format!(
                    "{}: {}",
                    self.prop_key(name, scope),
                    string_literal(&decode_entities(value))
                )),
            }
        }

        match classes.len() {
            0 => {}
            1 => entries.push(format!("class: {}", classes[0])),
            _ => entries.push(format!("class: [{}]", classes.join(", "))),
        }
        match styles.len() {
            0 => {}
            1 => entries.push(format!("style: {}", styles[0])),
            _ => entries.push(format!("style: [{}]", styles.join(", "))),
        }

        let object = (!entries.is_empty()).then(|| format!("{{ {} }}", entries.join(", ")));
        if spreads.is_empty() {
            return Ok(object);
        }
        let merge = self.helper("mergeProps");
        spreads.extend(object);
        Ok(Some(format!("{merge}({})", spreads.join(", "))))
    }

    fn prop_key(&self, key: &str, scope: &[String]) -> String {
        if let Some(dynamic) = key.strip_prefix('[').and_then(|k| k.strip_suffix(']')) {
            return format!("[{}]", prefix_identifiers(dynamic, scope));
        }
        let plain = key
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
        if plain {
            key.to_string()
        } else {
            string_literal(key)
        }
    }

    fn event_handler(
        &mut self,
        event: &str,
        modifiers: &[&str],
        value: &str,
        scope: &[String],
    ) -> GenResult {
        let mut key = format!("on{}", capitalize(&camelize(event)));
        let mut guards = Vec::new();
        let mut keys = Vec::new();
        let key_event = event.starts_with("key");

        for &m in modifiers {
            match m {
                "once" | "capture" | "passive" => key.push_str(&capitalize(m)),
                "native" => {}
                "left" | "right" if key_event => keys.push(m),
                "stop" | "prevent" | "self" | "ctrl" | "shift" | "alt" | "meta" | "exact"
                | "middle" | "left" | "right" => guards.push(m),
                _ => keys.push(m),
            }
        }

        let mut handler = if value.trim().is_empty() {
            "() => {}".to_string()
        } else if is_member_path(value) || is_function_expression(value) {
            prefix_identifiers(value, scope)
        } else {
            let mut inner_scope = scope.to_vec();
            inner_scope.push("$event".to_string());
            let body = prefix_identifiers(value.trim(), &inner_scope);
            if body.contains(';') {
                format!("$event => {{ {body} }}")
            } else {
                format!("$event => ({body})")
            }
        };

        if !guards.is_empty() {
            let with_modifiers = self.helper("withModifiers");
            handler = format!("{with_modifiers}({handler}, {})", string_array(&guards));
        }
        if !keys.is_empty() {
            let with_keys = self.helper("withKeys");
            handler = format!("{with_keys}({handler}, {})", string_array(&keys));
        }
        Ok(format!("{}: {handler}", self.prop_key(&key, scope)))
    }

    /// Props for `v-model` on form elements and components.
    fn model(
        &mut self,
        el: &Element,
        value: &str,
        modifiers: &[&str],
        scope: &[String],
    ) -> Vec<String> {
        let target = prefix_identifiers(value, scope);

        if is_component(&el.tag) {
            return vec![
                format!("modelValue: {target}"),
                format!("\"onUpdate:modelValue\": $event => ({target} = $event)"),
            ];
        }

        let input_type = el
            .attr("type")
            .and_then(|a| a.value.as_deref())
            .unwrap_or("text");
        let tag = el.tag.to_ascii_lowercase();

        if tag == "input" && input_type == "checkbox" {
            return vec![
                format!("checked: {target}"),
                format!("onChange: $event => ({target} = $event.target.checked)"),
            ];
        }
        if tag == "input" && input_type == "radio" {
            let own = el
                .attr("value")
                .and_then(|a| a.value.as_deref())
                .map(string_literal)
                .unwrap_or_else(|| "\"on\"".to_string());
            return vec![
                format!("checked: {target} === {own}"),
                format!("onChange: $event => ({target} = $event.target.value)"),
            ];
        }

        let mut read = "$event.target.value".to_string();
        if modifiers.contains(&"trim") {
            read.push_str(".trim()");
        }
        if modifiers.contains(&"number") {
            read = format!("Number({read})");
        }
        let event = if tag == "select" || modifiers.contains(&"lazy") {
            "onChange"
        } else {
            "onInput"
        };
        vec![
            format!("value: {target}"),
            format!("{event}: $event => ({target} = {read})"),
        ]
    }
}

fn reject_slot_directive(el: &Element) -> Result<(), String> {
    match el
        .attrs
        .iter()
        .find(|a| a.name.starts_with('#') || a.name == "v-slot" || a.name.starts_with("v-slot:"))
    {
        Some(attr) => Err(format!(
            "`{}` on <{}>: scoped and named slots are not supported",
            attr.name, el.tag
        )),
        None => Ok(()),
    }
}

fn directive_value(el: &Element, name: &str) -> Option<String> {
    el.attr(name).map(|a| a.value.clone().unwrap_or_default())
}

fn bind_arg(name: &str) -> Option<&str> {
    if name == "v-bind" {
        return Some("");
    }
    name.strip_prefix(':').or_else(|| name.strip_prefix("v-bind:"))
}

fn on_arg(name: &str) -> Option<&str> {
    name.strip_prefix('@').or_else(|| name.strip_prefix("v-on:"))
}

/// `click.stop.prevent` into `("click", ["stop", "prevent"])`. A dynamic
/// `[arg]` keeps its dots.
fn split_modifiers(arg: &str) -> (&str, Vec<&str>) {
    let split_at = if arg.starts_with('[') {
        arg.find(']').map(|close| close + 1)
    } else {
        arg.find('.')
    };
    match split_at {
        Some(at) if at < arg.len() => {
            let (name, rest) = arg.split_at(at);
            (name, rest.split('.').filter(|m| !m.is_empty()).collect())
        }
        _ => (arg, Vec::new()),
    }
}

/// Parse `item in list`, `(item, index) of list`.
fn parse_for(source: &str) -> Option<(Vec<String>, String)> {
    let (lhs, rhs) = source
        .split_once(" in ")
        .or_else(|| source.split_once(" of "))?;
    let lhs = lhs.trim();
    let lhs = lhs
        .strip_prefix('(')
        .and_then(|l| l.strip_suffix(')'))
        .unwrap_or(lhs);
    let aliases = split_params(lhs);
    let rhs = rhs.trim();
    if aliases.is_empty() || rhs.is_empty() {
        return None;
    }
    Some((aliases, rhs.to_string()))
}

fn is_component(tag: &str) -> bool {
    tag == "component"
        || tag.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        || tag.contains('-')
}

fn component_var(tag: &str) -> String {
    let ident: String = tag
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("_component_{ident}")
}

fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn string_array(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| string_literal(s)).collect();
    format!("[{}]", quoted.join(", "))
}
