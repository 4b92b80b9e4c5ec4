//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid listen address")]
    InvalidAddress,

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid timeout for {0}: must be between 1 and 300 seconds")]
    InvalidStageTimeout(&'static str),

    #[error("Invalid max_tokens: must be between 1 and 4096")]
    InvalidMaxTokens,

    #[error("Invalid temperature: must be between 0.0 and 2.0")]
    InvalidTemperature,

    #[error("Invalid {0} URL: must start with http:// or https://")]
    InvalidUrl(&'static str),

    #[error("Invalid worker idle timeout")]
    InvalidWorkerIdle,

    #[error("Invalid sweep interval: must be positive when idle eviction is enabled")]
    InvalidSweepInterval,
}
