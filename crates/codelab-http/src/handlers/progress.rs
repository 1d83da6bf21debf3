//! Challenge progress endpoints.

use axum::extract::{Json as AxumJson, Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use codelab_core::store::records::{progress_for_user, save_progress};
use codelab_core::store::ChallengeProgress;
use serde_json::{json, Value};

use crate::error::Result;
use crate::AppState;

/// Insert or update the row for `(user_id, challenge_id)`.
///
/// Store failures answer 500 with `{"status": "error", "error": ...}`, the
/// body the site's client already handles.
pub async fn save_progress_handler(
    State(state): State<AppState>,
    AxumJson(progress): AxumJson<ChallengeProgress>,
) -> std::result::Result<Json<Value>, (StatusCode, Json<Value>)> {
    log::info!(
        "Updating progress for user {} on challenge {}",
        progress.user_id,
        progress.challenge_id
    );

    let progress = progress.with_default_xp(&state.catalog);
    match save_progress(state.store.as_ref(), &progress).await {
        Ok(_) => Ok(Json(json!({ "status": "progress updated" }))),
        Err(e) => {
            log::error!("Store error: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "error": e.to_string() })),
            ))
        }
    }
}

pub async fn get_progress_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ChallengeProgress>>> {
    let rows = progress_for_user(state.store.as_ref(), &user_id).await?;
    log::debug!("Found {} progress rows for user {}", rows.len(), user_id);
    Ok(Json(rows))
}
