//! Unified error handling for the CLI.

use crate::config::ConfigError;
use std::path::PathBuf;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Engine(#[from] quarry_engine::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Malformed schema: {0}")]
    Schema(serde_json::Error),

    #[error("Invalid schema: {0}")]
    InvalidSchema(quarry_engine::Error),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read stdin: {0}")]
    Stdin(std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Engine(_) | CliError::Output(_) => 1,
            CliError::Config(_) | CliError::Schema(_) | CliError::InvalidSchema(_) => 2,
            CliError::Read { .. } | CliError::Stdin(_) => 3,
        }
    }
}
