//! CLI parse: clap types for codeweave. No behavior; definitions only.

use crate::context::{RequestContext, ResourceType};
use crate::pipeline::LifecyclePoint;
use crate::types::ResourceId;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// codeweave CLI - conditional code fragment injection
#[derive(Parser)]
#[command(name = "codeweave")]
#[command(about = "Inject global and per-resource style, script, and server code fragments")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fragment store directory (overrides the configured store path)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Request being simulated, as the host's routing would describe it.
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// Current resource id
    #[arg(long)]
    pub resource_id: Option<ResourceId>,

    /// Current resource slug
    #[arg(long)]
    pub slug: Option<String>,

    /// Current resource title
    #[arg(long)]
    pub title: Option<String>,

    /// Current resource type (page, post, other)
    #[arg(long = "type")]
    pub resource_type: Option<ResourceType>,

    /// Category slug of the current resource (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// The request is for a single resource
    #[arg(long)]
    pub singular: bool,

    /// The request is an admin-screen request
    #[arg(long)]
    pub admin: bool,
}

impl RequestArgs {
    pub fn to_context(&self) -> RequestContext {
        let mut builder = RequestContext::builder()
            .admin(self.admin)
            .singular(self.singular)
            .categories(self.categories.iter().cloned());
        if let Some(id) = self.resource_id {
            builder = builder.resource_id(id);
        }
        if let Some(slug) = &self.slug {
            builder = builder.slug(slug.clone());
        }
        if let Some(title) = &self.title {
            builder = builder.title(title.clone());
        }
        if let Some(resource_type) = self.resource_type {
            builder = builder.resource_type(resource_type);
        }
        builder.build()
    }
}

/// Fragment body, inline or from a file.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct ContentArgs {
    /// Read the fragment from this file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Fragment text (empty clears the slot)
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the markup injected at a lifecycle point
    Render {
        /// Lifecycle point (head or footer)
        #[arg(long, default_value = "footer")]
        point: LifecyclePoint,

        /// Also print contained script failures
        #[arg(long)]
        show_errors: bool,

        #[command(flatten)]
        request: RequestArgs,
    },
    /// Evaluate condition rules against a request
    Check {
        /// Rule text to test (defaults to the stored rules)
        #[arg(long)]
        rules: Option<String>,

        #[command(flatten)]
        request: RequestArgs,
    },
    /// Execute a server script through the sandbox
    Exec {
        #[command(flatten)]
        source: ContentArgs,

        #[command(flatten)]
        request: RequestArgs,
    },
    /// Store fragments and rules
    Set {
        #[command(subcommand)]
        command: SetCommands,
    },
    /// Remove stored fragments and rules
    Clear {
        #[command(subcommand)]
        command: ClearCommands,
    },
    /// List stored fragments
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum SetCommands {
    /// Global style sheet
    Style(ContentArgs),
    /// Global client script
    Script(ContentArgs),
    /// Global server script
    Server(ContentArgs),
    /// Server script for one resource
    Resource {
        /// Resource id
        #[arg(long)]
        id: ResourceId,

        #[command(flatten)]
        content: ContentArgs,
    },
    /// Condition rules, e.g. "all" or "post-12, about, category-news"
    Rules {
        rules: String,
    },
}

#[derive(Subcommand)]
pub enum ClearCommands {
    Style,
    Script,
    Server,
    Resource {
        /// Resource id
        #[arg(long)]
        id: ResourceId,
    },
    Rules,
}
