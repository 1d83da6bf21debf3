//! `/run` and `/run-output`.

use axum::extract::{Json as AxumJson, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResponse {
    pub output: String,
}

/// Runs the submitted code and returns its combined output.
///
/// Always answers 200: timeouts, launch failures and crashes of the
/// submission are reported inside `output`.
pub async fn run_handler(
    State(state): State<AppState>,
    AxumJson(request): AxumJson<RunRequest>,
) -> Json<RunResponse> {
    let code = request.code.unwrap_or_default();
    log::debug!("Running submission of {} bytes", code.len());

    let output = state.executor.execute_and_capture(&code).await;

    Json(RunResponse { output })
}
