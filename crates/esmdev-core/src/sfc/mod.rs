//! Single-file component (`.vue`) compilation.
//!
//! One browser import of `App.vue` turns into two requests:
//!
//! 1. `App.vue` returns the logic module. It binds the component options to
//!    `__script`, injects the component's styles, imports
//!    `App.vue?type=template` and attaches its `render` export.
//! 2. `App.vue?type=template` returns the render function compiled from the
//!    template block alone.
//!
//! Each phase reads the file afresh. If the file changes between the two
//! requests the pair is skewed; this is detected through the descriptor
//! cache fingerprints and reported with a warning.

pub mod cache;
pub mod descriptor;
pub mod html;
pub mod script;
pub mod template;

pub use cache::DescriptorCache;
pub use descriptor::{parse_descriptor, LogicBlock, SfcBlock, SfcDescriptor};
pub use script::{compile_script, compile_setup, SCRIPT_BINDING};
pub use template::compile_template;

use crate::dev::rewrite::rewrite_imports;
use crate::dev::stylesheet::{flatten, inject_style};
use crate::error::Error;
use crate::js::string_literal;
use std::path::Path;
use tracing::{debug, warn};

/// Query value selecting the render phase.
pub const TEMPLATE_QUERY: &str = "template";

/// Two-phase component compiler.
#[derive(Debug, Default)]
pub struct ComponentCompiler {
    cache: DescriptorCache,
}

impl ComponentCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn cache(&self) -> &DescriptorCache {
        &self.cache
    }

    /// Phase 1: the logic module for the component at `request_path`.
    ///
    /// `file` is the resolved source path and `source` its current content.
    pub fn compile_script_phase(
        &self,
        request_path: &str,
        file: &Path,
        source: &str,
    ) -> Result<String, Error> {
        let label = file.display().to_string();
        let lookup = self.cache.descriptor(file, source)?;
        let descriptor = &lookup.descriptor;

        let mut code = match descriptor.logic() {
            Some(LogicBlock::Script(block)) => compile_script(&block.content, &label)?,
            Some(LogicBlock::Setup(block)) => compile_setup(&block.content, &label)?,
            None => format!("const {SCRIPT_BINDING} = {{}};\n"),
        };

        for (index, style) in descriptor.styles.iter().enumerate() {
            if style.has_attr("scoped") {
                debug!(file = %label, "scoped styles are injected unscoped");
            }
            let literal = string_literal(&flatten(&style.content));
            code.push_str(&inject_style(&format!("__style{index}"), &literal));
        }

        if descriptor.template.is_some() {
            let render_url = format!("{request_path}?type={TEMPLATE_QUERY}");
            code.push_str(&format!(
                "import {{ render as __render }} from {};\n{SCRIPT_BINDING}.render = __render;\n",
                string_literal(&render_url)
            ));
        }
        code.push_str(&format!("export default {SCRIPT_BINDING};\n"));

        self.cache.mark_script_served(file, &lookup.fingerprint);
        rewrite_imports(&code, &label)
    }

    /// Phase 2: the render module compiled from the template block.
    pub fn compile_template_phase(&self, file: &Path, source: &str) -> Result<String, Error> {
        let label = file.display().to_string();
        let lookup = self.cache.descriptor(file, source)?;

        if self.cache.is_skewed(file, &lookup.fingerprint) {
            warn!(
                file = %label,
                "component changed between its script and template requests; reload the page"
            );
        }

        let template = lookup
            .descriptor
            .template
            .as_ref()
            .ok_or_else(|| Error::resolution(&label, "component has no <template> block"))?;

        let code = compile_template(&template.content, &label)?;
        rewrite_imports(&code, &label)
    }
}
