//! Configuration type definitions
//!
//! Every section carries serde defaults so an empty YAML document, or no file
//! at all, yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ConfigError;

pub const DEFAULT_INTERPRETER: &str = "python";
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;
pub const DEFAULT_EXPECTED_OUTPUT: &str = "hello\nhello";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CodelabConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// HTTP listener settings. Translated into the router's own config by the
/// binary so the core crate stays free of web dependencies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
    #[serde(default)]
    pub cors_origins: Option<Vec<String>>,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    #[serde(default = "default_true")]
    pub enable_logging: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            enable_cors: true,
            cors_origins: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            enable_logging: true,
        }
    }
}

/// Parameters of the bounded process runner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionConfig {
    /// Interpreter binary; receives the materialized file path as its only argument.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Directory for materialized sources. `None` uses the OS temp dir.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// Wall-clock deadline in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            temp_dir: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ExecutionConfig {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            ..Default::default()
        }
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs_f64();
        self
    }

    /// Deadline as a `Duration`; falls back to the default for values
    /// `validate` would reject.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }

    /// Resolved directory for materialized sources.
    pub fn source_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interpreter.trim().is_empty() {
            return Err(ConfigError::Validation(
                "execution.interpreter must not be empty".to_string(),
            ));
        }
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "execution.timeout_secs must be a positive number, got {}",
                self.timeout_secs
            )));
        }
        if let Some(dir) = &self.temp_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::Validation(
                    "execution.temp_dir must not be empty when set".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationConfig {
    /// Expected output used by `/evaluate-output` when no challenge is named.
    #[serde(default = "default_expected_output")]
    pub default_expected_output: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            default_expected_output: default_expected_output(),
        }
    }
}

impl CodelabConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.bind_addr is not a socket address: {}",
                self.server.bind_addr
            )));
        }
        if self.server.max_body_size == 0 {
            return Err(ConfigError::Validation(
                "server.max_body_size must be greater than zero".to_string(),
            ));
        }
        self.execution.validate()
    }
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_body_size() -> usize {
    DEFAULT_MAX_BODY_SIZE
}

fn default_interpreter() -> String {
    DEFAULT_INTERPRETER.to_string()
}

fn default_timeout_secs() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_expected_output() -> String {
    DEFAULT_EXPECTED_OUTPUT.to_string()
}
