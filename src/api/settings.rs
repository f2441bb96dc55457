//! Engine settings endpoints.

use axum::{extract::State, Json};

use super::{error, success, ApiResult};
use crate::engine::validate_settings;
use crate::models::EngineSettings;
use crate::AppState;

/// GET /api/settings - Current scoring, pipeline and assignment settings.
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<EngineSettings> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.load_settings().await {
        Ok(settings) => success(settings, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/settings - Replace the settings. Invalid tables are refused.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<EngineSettings>,
) -> ApiResult<EngineSettings> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate_settings(&settings) {
        return error(e, revision_id);
    }

    match state.repo.save_settings(&settings).await {
        Ok(()) => {
            tracing::info!(
                pipeline_mode = ?settings.pipeline_mode,
                strategy = settings.assignment.strategy.as_str(),
                "Engine settings updated"
            );
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(settings, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
