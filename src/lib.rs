//! Codeweave: Conditional Code Fragment Injection
//!
//! Stores site-wide and per-resource code fragments (style, client script,
//! server script) and splices them into rendered responses. Global fragments
//! are gated by comma-separated condition rules; server scripts run in an
//! isolated sandbox whose failures become inline diagnostic comments.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod markup;
pub mod pipeline;
pub mod rules;
pub mod sandbox;
pub mod store;
pub mod types;

pub use context::{RequestContext, ResourceType};
pub use pipeline::{InjectionPipeline, LifecyclePoint, RenderedPoint};
pub use rules::{should_inject, ConditionRule, RuleSet};
pub use sandbox::{ErrorInfo, InjectionResult, SandboxConfig, ScriptSandbox};
pub use store::{FragmentStore, MemoryFragmentStore, SledFragmentStore};
pub use types::{CodeFragment, FragmentKind, ResourceId, Scope};
