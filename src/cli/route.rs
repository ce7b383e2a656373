//! CLI route: single route table and run context. Dispatches to the engine and presentation.

use crate::cli::parse::{ClearCommands, Commands, ContentArgs, RequestArgs, SetCommands};
use crate::cli::presentation::{
    format_check_result, format_fragment_list_json, format_fragment_list_text, format_rendered,
    format_stored,
};
use crate::config::ConfigLoader;
use crate::error::{ApiError, StorageError};
use crate::pipeline::InjectionPipeline;
use crate::rules::RuleSet;
use crate::sandbox::ScriptSandbox;
use crate::store::{FragmentStore, SledFragmentStore};
use crate::types::{FragmentKind, Scope};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Runtime context for CLI execution: store and pipeline.
pub struct RunContext {
    store: Arc<SledFragmentStore>,
    pipeline: InjectionPipeline,
    store_path: PathBuf,
}

impl RunContext {
    /// Create run context from workspace root, optional config path, and optional store override.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        store_override: Option<PathBuf>,
    ) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        }
        .validated()?;

        let store_path = match store_override {
            Some(path) => path,
            None => config.store.resolve_path(&workspace_root),
        };
        std::fs::create_dir_all(&store_path).map_err(StorageError::IoError)?;
        let store = Arc::new(SledFragmentStore::new(&store_path)?);
        info!(store = %store_path.display(), "Fragment store opened");

        let pipeline = InjectionPipeline::new(
            store.clone(),
            ScriptSandbox::new(config.sandbox.clone()),
        );

        Ok(Self {
            store,
            pipeline,
            store_path,
        })
    }

    pub fn store_path(&self) -> &PathBuf {
        &self.store_path
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Render {
                point,
                show_errors,
                request,
            } => {
                let rendered = self.pipeline.render(*point, &request.to_context());
                Ok(format_rendered(&rendered, *show_errors))
            }
            Commands::Check { rules, request } => self.handle_check(rules.as_deref(), request),
            Commands::Exec { source, request } => {
                let script = read_content(source)?;
                let result = self
                    .pipeline
                    .sandbox()
                    .execute_with_context(&script, &request.to_context());
                match result.error {
                    Some(error) => Err(ApiError::ScriptFailed(error.message)),
                    None => Ok(result.emitted_markup),
                }
            }
            Commands::Set { command } => self.handle_set(command),
            Commands::Clear { command } => self.handle_clear(command),
            Commands::List { format } => {
                let records = self.store.list()?;
                match format.as_str() {
                    "json" => format_fragment_list_json(&records),
                    "text" => Ok(format_fragment_list_text(&records)),
                    other => Err(ApiError::InvalidArgument(format!(
                        "Invalid format: {} (must be 'text' or 'json')",
                        other
                    ))),
                }
            }
        }
    }

    fn handle_check(&self, rules: Option<&str>, request: &RequestArgs) -> Result<String, ApiError> {
        let text = match rules {
            Some(text) => text.to_string(),
            None => self.store.condition_rules()?,
        };
        let rule_set = RuleSet::parse(&text);
        let ctx = request.to_context();
        Ok(format_check_result(&rule_set, rule_set.first_match(&ctx), &ctx))
    }

    fn handle_set(&self, command: &SetCommands) -> Result<String, ApiError> {
        let (kind, scope, content) = match command {
            SetCommands::Style(content) => (FragmentKind::Style, Scope::Global, read_content(content)?),
            SetCommands::Script(content) => {
                (FragmentKind::ClientScript, Scope::Global, read_content(content)?)
            }
            SetCommands::Server(content) => {
                (FragmentKind::ServerScript, Scope::Global, read_content(content)?)
            }
            SetCommands::Resource { id, content } => (
                FragmentKind::ServerScript,
                Scope::Resource(*id),
                read_content(content)?,
            ),
            SetCommands::Rules { rules } => {
                self.store.set_rules(rules)?;
                self.store.flush()?;
                let parsed = RuleSet::parse(rules);
                return Ok(format!("Stored condition rules ({} rules)", parsed.len()));
            }
        };

        match scope {
            Scope::Global => self.store.set_global(kind, &content)?,
            Scope::Resource(id) => self.store.set_resource(id, &content)?,
        }
        self.store.flush()?;
        let record = self.store.get_record(scope, kind)?;
        Ok(format_stored(kind, scope, record.as_ref()))
    }

    fn handle_clear(&self, command: &ClearCommands) -> Result<String, ApiError> {
        let (label, removed) = match command {
            ClearCommands::Style => ("global style", self.store.clear_global(FragmentKind::Style)?),
            ClearCommands::Script => (
                "global client script",
                self.store.clear_global(FragmentKind::ClientScript)?,
            ),
            ClearCommands::Server => (
                "global server script",
                self.store.clear_global(FragmentKind::ServerScript)?,
            ),
            ClearCommands::Resource { id } => {
                let removed = self.store.clear_resource(*id)?;
                self.store.flush()?;
                return Ok(if removed {
                    format!("Removed server script for resource {}", id)
                } else {
                    format!("Nothing stored for resource {}", id)
                });
            }
            ClearCommands::Rules => {
                let had_rules = !self.store.condition_rules()?.is_empty();
                self.store.set_rules("")?;
                ("condition rules", had_rules)
            }
        };
        self.store.flush()?;
        Ok(if removed {
            format!("Removed {}", label)
        } else {
            format!("Nothing stored for {}", label)
        })
    }
}

fn read_content(args: &ContentArgs) -> Result<String, ApiError> {
    match (&args.file, &args.content) {
        (Some(path), _) => std::fs::read_to_string(path).map_err(|e| {
            ApiError::InvalidArgument(format!("Failed to read {}: {}", path.display(), e))
        }),
        (None, Some(content)) => Ok(content.clone()),
        (None, None) => Err(ApiError::InvalidArgument(
            "Either --file or --content is required".to_string(),
        )),
    }
}
