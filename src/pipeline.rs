//! Injection pipeline: what gets spliced into a response at each lifecycle point.
//!
//! Global fragments are gated by the condition rules. The per-resource server
//! script is gated only by its own presence, so it runs on every singular
//! request that has one, whatever the rules say.

use crate::context::RequestContext;
use crate::markup::{script_block, style_block};
use crate::rules::should_inject;
use crate::sandbox::{ErrorInfo, InjectionResult, ScriptSandbox};
use crate::store::FragmentStore;
use crate::types::{CodeFragment, FragmentKind, ResourceId, Scope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info_span, warn};

/// Render-lifecycle point at which the host invokes the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecyclePoint {
    Head,
    Footer,
}

impl fmt::Display for LifecyclePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecyclePoint::Head => f.write_str("head"),
            LifecyclePoint::Footer => f.write_str("footer"),
        }
    }
}

impl FromStr for LifecyclePoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "head" => Ok(LifecyclePoint::Head),
            "footer" => Ok(LifecyclePoint::Footer),
            other => Err(format!(
                "Invalid lifecycle point: {} (must be 'head' or 'footer')",
                other
            )),
        }
    }
}

/// Markup for one lifecycle point plus any contained script failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPoint {
    pub markup: String,
    pub errors: Vec<ErrorInfo>,
}

impl RenderedPoint {
    fn push(&mut self, markup: &str) {
        self.markup.push_str(markup);
    }

    fn push_result(&mut self, result: InjectionResult) {
        self.markup.push_str(&result.emitted_markup);
        if let Some(error) = result.error {
            self.errors.push(error);
        }
    }
}

pub struct InjectionPipeline {
    store: Arc<dyn FragmentStore + Send + Sync>,
    sandbox: ScriptSandbox,
}

impl InjectionPipeline {
    pub fn new(store: Arc<dyn FragmentStore + Send + Sync>, sandbox: ScriptSandbox) -> Self {
        Self { store, sandbox }
    }

    pub fn sandbox(&self) -> &ScriptSandbox {
        &self.sandbox
    }

    /// Markup for the head section.
    pub fn head(&self, ctx: &RequestContext) -> String {
        self.render(LifecyclePoint::Head, ctx).markup
    }

    /// Markup for the footer section.
    pub fn footer(&self, ctx: &RequestContext) -> String {
        self.render(LifecyclePoint::Footer, ctx).markup
    }

    pub fn render(&self, point: LifecyclePoint, ctx: &RequestContext) -> RenderedPoint {
        let span = info_span!("inject", point = %point, resource_id = ?ctx.resource_id());
        let _guard = span.enter();

        let mut out = RenderedPoint::default();
        match point {
            LifecyclePoint::Head => self.render_head(ctx, &mut out),
            LifecyclePoint::Footer => self.render_footer(ctx, &mut out),
        }
        out
    }

    fn render_head(&self, ctx: &RequestContext, out: &mut RenderedPoint) {
        if !self.gate(ctx) {
            return;
        }
        let style = self.global(FragmentKind::Style);
        if !style.is_empty() {
            out.push(&style_block(&style.content));
        }
    }

    fn render_footer(&self, ctx: &RequestContext, out: &mut RenderedPoint) {
        if self.gate(ctx) {
            let script = self.global(FragmentKind::ClientScript);
            if !script.is_empty() {
                out.push(&script_block(&script.content));
            }

            let server = self.global(FragmentKind::ServerScript);
            out.push_result(self.sandbox.execute_fragment(&server, ctx));
        }

        if let Some(resource_id) = ctx.singular_resource_id() {
            let server = self.resource(resource_id);
            out.push_result(self.sandbox.execute_fragment(&server, ctx));
        }
    }

    /// Rule gate; rules are re-read at every point.
    fn gate(&self, ctx: &RequestContext) -> bool {
        let rules = self.store.condition_rules().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read condition rules, treating as empty");
            String::new()
        });
        let open = should_inject(&rules, ctx);
        debug!(open, "Rule gate evaluated");
        open
    }

    fn global(&self, kind: FragmentKind) -> CodeFragment {
        self.store.global_fragment(kind).unwrap_or_else(|e| {
            warn!(kind = %kind, error = %e, "Failed to read global fragment, treating as empty");
            CodeFragment::empty(kind, Scope::Global)
        })
    }

    fn resource(&self, resource_id: ResourceId) -> CodeFragment {
        self.store.resource_fragment(resource_id).unwrap_or_else(|e| {
            warn!(resource_id, error = %e, "Failed to read resource fragment, treating as empty");
            CodeFragment::empty(FragmentKind::ServerScript, Scope::Resource(resource_id))
        })
    }
}
