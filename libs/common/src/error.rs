//! Custom error types for the common library
//!
//! This module defines the errors raised while loading configuration and
//! while driving external media tools.

use std::time::Duration;

use thiserror::Error;

/// Custom error type for configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error occurred while reading or deserializing configuration sources
    #[error("Configuration load error: {0}")]
    Load(#[from] config::ConfigError),

    /// A configuration value was present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Custom error type for external process execution
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The program could not be started
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program started but waiting for it failed
    #[error("Failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program did not finish in time and was killed
    #[error("{program} timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// Type alias for Result with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Type alias for Result with ProcessError
pub type ProcessResult<T> = Result<T, ProcessError>;
