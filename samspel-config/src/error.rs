//! Error types for configuration loading and validation.

use std::path::PathBuf;

use thiserror::Error;
use validator::ValidationErrors;

/// Unified configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("configuration parsing error: {0}")]
    Parsing(#[from] figment::Error),
}
