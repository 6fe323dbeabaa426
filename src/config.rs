//! Configuration System
//!
//! Layered configuration for the daemon, tree policies and logging. Sources are
//! merged with the `config` crate: built-in defaults, then the global file,
//! then the workspace file, then `PROVEBIT__SECTION__KEY` environment variables.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::tree::builder::{EmptyTreePolicy, OddNodePolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod merge;
mod sources;

pub use sources::global_file::global_config_path;
pub use sources::workspace_file::WORKSPACE_CONFIG_FILE;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvebitConfig {
    /// Rebuild scheduler settings
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Merkle tree construction policies
    #[serde(default)]
    pub tree: TreeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Rebuild scheduler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Period used when a caller does not choose one
    #[serde(default = "default_period_secs")]
    pub default_period_secs: u64,

    /// Oldest activity-log entries are dropped past this count
    #[serde(default = "default_max_log_entries")]
    pub max_log_entries: usize,
}

fn default_period_secs() -> u64 {
    60
}

fn default_max_log_entries() -> usize {
    1000
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            default_period_secs: default_period_secs(),
            max_log_entries: default_max_log_entries(),
        }
    }
}

/// Merkle tree construction policies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    #[serde(default)]
    pub odd_node_policy: OddNodePolicy,

    #[serde(default)]
    pub empty_tree_policy: EmptyTreePolicy,

    /// Follow symbolic links while walking tracked directories
    #[serde(default)]
    pub follow_symlinks: bool,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Daemon(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Daemon(msg) => write!(f, "Daemon: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ProvebitConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.daemon.default_period_secs == 0 {
            errors.push(ValidationError::Daemon(
                "default_period_secs must be positive".to_string(),
            ));
        }
        if self.daemon.max_log_entries == 0 {
            errors.push(ValidationError::Daemon(
                "max_log_entries must be positive".to_string(),
            ));
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

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}

/// Loads [`ProvebitConfig`] from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace
    ///
    /// Precedence (lowest to highest): defaults, global file, workspace
    /// `provebit.toml`, environment.
    pub fn load(workspace_root: &Path) -> Result<ProvebitConfig, ApiError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = builder.add_source(
            config::Environment::with_prefix("PROVEBIT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
        Self::finish(builder)
    }

    /// Load configuration from one explicit file on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<ProvebitConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path.to_path_buf()).required(true));
        Self::finish(builder)
    }

    /// Global config file location, if one can be determined
    pub fn global_config_path() -> Option<PathBuf> {
        global_config_path()
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<ProvebitConfig, ApiError> {
        let config: ProvebitConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })?;
        Ok(config)
    }
}
