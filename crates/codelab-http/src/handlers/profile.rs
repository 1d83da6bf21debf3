//! Profile endpoints used by sign-up and sign-in.

use axum::extract::{Json as AxumJson, Path, State};
use axum::response::Json;
use codelab_core::store::records::{profile_by_id, profile_by_username, save_profile};
use codelab_core::store::Profile;
use serde_json::{json, Value};

use crate::error::{Result, ServerError};
use crate::AppState;

pub async fn save_profile_handler(
    State(state): State<AppState>,
    AxumJson(profile): AxumJson<Profile>,
) -> Result<Json<Value>> {
    if profile.id.trim().is_empty() {
        return Err(ServerError::invalid_request("id must not be empty"));
    }
    if profile.username.trim().is_empty() {
        return Err(ServerError::invalid_request("username must not be empty"));
    }

    save_profile(state.store.as_ref(), &profile).await?;
    log::info!("Saved profile {} ({})", profile.id, profile.username);

    Ok(Json(json!({ "status": "profile saved", "id": profile.id })))
}

pub async fn get_profile_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Profile>> {
    profile_by_id(state.store.as_ref(), &id)
        .await?
        .map(Json)
        .ok_or_else(|| ServerError::not_found(format!("profile '{}'", id)))
}

pub async fn get_profile_by_username_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Profile>> {
    profile_by_username(state.store.as_ref(), &username)
        .await?
        .map(Json)
        .ok_or_else(|| ServerError::not_found(format!("username '{}'", username)))
}
