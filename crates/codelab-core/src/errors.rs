//! Error types for the execution core and its configuration
//!
//! Execution failures never reach the caller as faults: the classifier turns
//! every `ExecutionError` into the `"Error: ..."` text the protocol expects.
//! Configuration errors surface at startup, before any request is served.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("could not write submitted source: {0}")]
    Materialization(String),
    #[error("could not launch interpreter '{interpreter}': {message}")]
    Launch { interpreter: String, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },
    #[error("Failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid value for {key}: {message}")]
    InvalidEnv { key: String, message: String },
    #[error("Validation error: {0}")]
    Validation(String),
}
