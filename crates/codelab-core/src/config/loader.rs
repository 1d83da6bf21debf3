//! Configuration loader for YAML files and environment overrides

use crate::config::types::*;
use crate::errors::ConfigError;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const ENV_INTERPRETER: &str = "CODELAB_INTERPRETER";
pub const ENV_TEMP_DIR: &str = "CODELAB_TEMP_DIR";
pub const ENV_TIMEOUT_SECS: &str = "CODELAB_TIMEOUT_SECS";
pub const ENV_BIND_ADDR: &str = "CODELAB_BIND_ADDR";

/// Configuration loader with environment resolution
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<CodelabConfig, ConfigError> {
        let path = path.as_ref();

        let content = Self::read(path).await?;
        Self::from_str(&content)
    }

    /// Load configuration from a file if it exists, defaults otherwise.
    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> Result<CodelabConfig, ConfigError> {
        let config = Self::read_or_default(path).await?;
        config.validate()?;
        Ok(config)
    }

    /// Like `load_or_default`, but leaves validation to the caller so that
    /// later layers (command line flags) can still replace bad values.
    pub async fn read_or_default<P: AsRef<Path>>(path: P) -> Result<CodelabConfig, ConfigError> {
        let path = path.as_ref();
        if fs::try_exists(path).await.unwrap_or(false) {
            log::info!("Loading configuration from file: {}", path.display());
            let content = Self::read(path).await?;
            Self::parse(&content)
        } else {
            log::info!(
                "No configuration file at {}, using defaults",
                path.display()
            );
            let mut config = CodelabConfig::default();
            Self::apply_env_overrides(&mut config)?;
            Ok(config)
        }
    }

    /// Load configuration from a YAML string
    pub fn from_str(content: &str) -> Result<CodelabConfig, ConfigError> {
        let config = Self::parse(content)?;
        config.validate()?;
        Ok(config)
    }

    async fn read(path: &Path) -> Result<String, ConfigError> {
        fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }

    /// YAML plus environment overrides, unvalidated.
    fn parse(content: &str) -> Result<CodelabConfig, ConfigError> {
        // An empty document deserializes to `null`, which serde_yaml rejects for a struct.
        let mut config: CodelabConfig = if content.trim().is_empty() {
            CodelabConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };

        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Apply `CODELAB_*` environment variables on top of file values.
    pub fn apply_env_overrides(config: &mut CodelabConfig) -> Result<(), ConfigError> {
        if let Some(interpreter) = non_empty_env(ENV_INTERPRETER) {
            config.execution.interpreter = interpreter;
        }

        if let Some(dir) = non_empty_env(ENV_TEMP_DIR) {
            config.execution.temp_dir = Some(PathBuf::from(dir));
        }

        if let Some(raw) = non_empty_env(ENV_TIMEOUT_SECS) {
            config.execution.timeout_secs =
                raw.trim()
                    .parse::<f64>()
                    .map_err(|e| ConfigError::InvalidEnv {
                        key: ENV_TIMEOUT_SECS.to_string(),
                        message: e.to_string(),
                    })?;
        }

        if let Some(addr) = non_empty_env(ENV_BIND_ADDR) {
            config.server.bind_addr = addr;
        }

        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
