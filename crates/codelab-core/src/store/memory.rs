//! Process-local `RowStore` backed by a map of tables.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{match_filter, Filter, Row, RowStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryRowStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently in `table`.
    pub async fn len(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    async fn select(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert(
        &self,
        table: &str,
        match_keys: &[&str],
        fields: Row,
    ) -> Result<usize, StoreError> {
        let filter = match_filter(match_keys, &fields)?;

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();

        let mut updated = 0;
        for row in rows.iter_mut().filter(|r| filter.matches(r)) {
            for (column, value) in &fields {
                row.insert(column.clone(), value.clone());
            }
            updated += 1;
        }

        if updated == 0 {
            log::debug!("Inserting new row into {}", table);
            rows.push(fields);
            return Ok(1);
        }

        log::debug!("Updated {} row(s) in {}", updated, table);
        Ok(updated)
    }
}
