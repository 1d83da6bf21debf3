//! Core of the Codelab challenge backend.
//!
//! The centre of this crate is the execution subsystem: submitted source text
//! is written to a unique temporary file, run by a fixed interpreter under a
//! wall-clock deadline, and reduced to the plain text returned to the site.
//!
//! - **Execution**: materializer, bounded runner and outcome classifier
//! - **Evaluation**: whitespace-insensitive output comparison and the challenge catalog
//! - **Storage**: row store abstraction for profiles and challenge progress
//! - **Configuration**: YAML file with environment overrides

pub mod config;
pub mod errors;
pub mod evaluation;
pub mod executors;
pub mod store;

pub use config::*;
pub use errors::{ConfigError, ExecutionError};
pub use evaluation::{evaluate, Challenge, ChallengeCatalog};
pub use executors::{CodeExecutor, ExecutionOutcome, LocalProcessExecutor};
pub use store::{InMemoryRowStore, RowStore, StoreError};
