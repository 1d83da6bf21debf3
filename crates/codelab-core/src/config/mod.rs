//! Configuration module
//!
//! YAML file values are layered under `CODELAB_*` environment variables;
//! the binary applies command line flags last.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;


use crate::errors::ConfigError;
use std::path::Path;

/// Load a configuration from a YAML file
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<CodelabConfig, ConfigError> {
    ConfigLoader::from_file(path).await
}
