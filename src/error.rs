//! Error types for the provebit proof-of-existence core.

use std::path::PathBuf;
use thiserror::Error;

/// Tracked-set registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Path is already tracked: {0}")]
    AlreadyTracked(PathBuf),

    #[error("Path is not tracked: {0}")]
    NotTracked(PathBuf),
}

/// Merkle tree construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("No leaves to build a tree from")]
    EmptyLeafSet,
}

/// Rebuild scheduler control errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DaemonError {
    #[error("Invalid period: {0} seconds (must be positive)")]
    InvalidPeriod(u64),

    #[error("Daemon is already running")]
    AlreadyRunning,

    #[error("Daemon is not running")]
    DaemonNotRunning,

    #[error("Daemon has been killed; create a new daemon to resume")]
    Terminated,

    #[error("Failed to spawn daemon thread: {0}")]
    Spawn(String),
}

/// Boundary errors returned by the proof API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Daemon(#[from] DaemonError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
