//! Row storage for profiles and challenge progress.
//!
//! The execution core never touches this module. Backends implement
//! `RowStore`; the server ships with `InMemoryRowStore`.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod memory;
pub mod records;

pub use memory::InMemoryRowStore;
pub use records::{ChallengeProgress, Profile, PROFILES_TABLE, PROGRESS_TABLE};

/// A row is a JSON object keyed by column name.
pub type Row = Map<String, Value>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Missing match key '{0}' in row")]
    MissingKey(String),
    #[error("Invalid row in table '{table}': {message}")]
    InvalidRow { table: String, message: String },
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Column equality conditions, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions
            .iter()
            .all(|(column, value)| row.get(column) == Some(value))
    }
}

#[async_trait]
pub trait RowStore: Send + Sync {
    /// Rows of `table` matching `filter`, in insertion order.
    async fn select(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError>;

    /// Update every row whose `match_keys` columns equal those in `fields`,
    /// merging `fields` into it; insert `fields` when nothing matched.
    /// Returns the number of rows written.
    async fn upsert(&self, table: &str, match_keys: &[&str], fields: Row)
        -> Result<usize, StoreError>;
}

/// Filter selecting the rows `upsert` would update for `fields`.
pub fn match_filter(match_keys: &[&str], fields: &Row) -> Result<Filter, StoreError> {
    match_keys.iter().try_fold(Filter::new(), |filter, key| {
        fields
            .get(*key)
            .map(|value| filter.eq(*key, value.clone()))
            .ok_or_else(|| StoreError::MissingKey((*key).to_string()))
    })
}
