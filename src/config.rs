//! Configuration System
//!
//! Layered configuration for the engine's ambient concerns: where the fragment
//! store lives, sandbox resource limits, and logging. Layers, lowest to
//! highest: built-in defaults, the global config file, workspace config files,
//! then `CODEWEAVE__SECTION__KEY` environment variables.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::sandbox::{SandboxConfig, MAX_CALL_LEVELS};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod merge;
mod sources;

pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeweaveConfig {
    /// Fragment store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Server script limits
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fragment store location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store directory; relative paths resolve against the workspace root
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".codeweave/store")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl StoreConfig {
    pub fn resolve_path(&self, workspace_root: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            workspace_root.join(&self.path)
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Store(String),
    Sandbox(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Store(msg) => write!(f, "Store: {}", msg),
            ValidationError::Sandbox(msg) => write!(f, "Sandbox: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl CodeweaveConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.store.path.as_os_str().is_empty() {
            errors.push(ValidationError::Store(
                "Store path cannot be empty".to_string(),
            ));
        }

        if self.sandbox.max_call_levels > MAX_CALL_LEVELS {
            errors.push(ValidationError::Sandbox(format!(
                "max_call_levels {} exceeds the maximum of {}",
                self.sandbox.max_call_levels, MAX_CALL_LEVELS
            )));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding all problems into one error.
    pub fn validated(self) -> Result<Self, ApiError> {
        self.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })?;
        Ok(self)
    }
}

/// Loads [`CodeweaveConfig`] from the layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, global file, workspace files, then environment overrides.
    pub fn load(workspace_root: &Path) -> Result<CodeweaveConfig, ApiError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let config: CodeweaveConfig = builder
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Load a single explicit file over the defaults (environment still applies).
    pub fn load_from_file(path: &Path) -> Result<CodeweaveConfig, ApiError> {
        let config: CodeweaveConfig = merge::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Defaults only.
    pub fn defaults() -> Result<CodeweaveConfig, ApiError> {
        let config: CodeweaveConfig = Config::builder().build()?.try_deserialize()?;
        Ok(config)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("CODEWEAVE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
