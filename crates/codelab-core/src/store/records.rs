//! Typed records on top of `RowStore`.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::{Filter, Row, RowStore, StoreError};
use crate::evaluation::ChallengeCatalog;

pub const PROFILES_TABLE: &str = "profiles";
pub const PROGRESS_TABLE: &str = "challenge_progress";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub accessibility_mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeProgress {
    pub user_id: String,
    pub challenge_id: String,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_earned: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl ChallengeProgress {
    /// Fill in `xp_earned` from the catalog when the caller left it out.
    /// Unknown challenges earn nothing.
    pub fn with_default_xp(mut self, catalog: &ChallengeCatalog) -> Self {
        if self.xp_earned.is_none() {
            let xp = catalog
                .get(&self.challenge_id)
                .map(|c| c.xp_for(self.progress, self.completed))
                .unwrap_or(0);
            self.xp_earned = Some(xp);
        }
        self
    }
}

fn to_row<T: Serialize>(table: &str, record: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::InvalidRow {
            table: table.to_string(),
            message: format!("expected an object, got {}", other),
        }),
    }
}

fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(StoreError::from))
        .collect()
}

/// Insert or update the progress row for `(user_id, challenge_id)`.
pub async fn save_progress(
    store: &dyn RowStore,
    progress: &ChallengeProgress,
) -> Result<usize, StoreError> {
    let row = to_row(PROGRESS_TABLE, progress)?;
    store
        .upsert(PROGRESS_TABLE, &["user_id", "challenge_id"], row)
        .await
}

pub async fn progress_for_user(
    store: &dyn RowStore,
    user_id: &str,
) -> Result<Vec<ChallengeProgress>, StoreError> {
    let rows = store
        .select(PROGRESS_TABLE, &Filter::new().eq("user_id", user_id))
        .await?;
    from_rows(rows)
}

/// Insert or update a profile by `id`.
pub async fn save_profile(store: &dyn RowStore, profile: &Profile) -> Result<usize, StoreError> {
    let row = to_row(PROFILES_TABLE, profile)?;
    store.upsert(PROFILES_TABLE, &["id"], row).await
}

pub async fn profile_by_id(store: &dyn RowStore, id: &str) -> Result<Option<Profile>, StoreError> {
    let rows = store
        .select(PROFILES_TABLE, &Filter::new().eq("id", id))
        .await?;
    Ok(from_rows(rows)?.into_iter().next())
}

pub async fn profile_by_username(
    store: &dyn RowStore,
    username: &str,
) -> Result<Option<Profile>, StoreError> {
    let rows = store
        .select(PROFILES_TABLE, &Filter::new().eq("username", username))
        .await?;
    Ok(from_rows(rows)?.into_iter().next())
}
