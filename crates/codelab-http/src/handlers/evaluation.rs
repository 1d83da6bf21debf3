//! Output checking and the challenge list.

use axum::extract::{Json as AxumJson, State};
use axum::response::Json;
use codelab_core::evaluation::{evaluate, Challenge};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::AppState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub output: Option<String>,
    /// Challenge whose expected output applies; the configured default when absent.
    #[serde(default)]
    pub challenge_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub success: bool,
}

pub async fn evaluate_output_handler(
    State(state): State<AppState>,
    AxumJson(request): AxumJson<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>> {
    let output = request.output.unwrap_or_default();
    log::debug!("Received output: {:?}", output);

    let success = match request.challenge_id.as_deref() {
        Some(id) => state
            .catalog
            .get(id)
            .ok_or_else(|| ServerError::not_found(format!("challenge '{}'", id)))?
            .evaluate(&output),
        None => evaluate(&output, &state.default_expected_output),
    };

    Ok(Json(EvaluateResponse { success }))
}

pub async fn challenges_handler(State(state): State<AppState>) -> Json<Vec<Challenge>> {
    Json(state.catalog.all().to_vec())
}
