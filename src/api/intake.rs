//! Intake wizard helper endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::engine::intake::validate_step;
use crate::errors::{AppError, FieldErrors};
use crate::models::{IntakeStep, LeadSubmission};
use crate::AppState;

/// Result of validating one wizard step.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepValidation {
    pub valid: bool,
    pub errors: FieldErrors,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheckRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheck {
    pub warning: Option<String>,
}

/// POST /api/intake/:step/validate - Validate a single wizard step.
///
/// Field errors are a normal answer here, not a failed request.
pub async fn validate_intake_step(
    State(state): State<AppState>,
    Path(step): Path<String>,
    Json(submission): Json<LeadSubmission>,
) -> ApiResult<StepValidation> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let Some(step) = IntakeStep::from_str(&step) else {
        return error(
            AppError::BadRequest(format!("Unknown intake step: {}", step)),
            revision_id,
        );
    };

    let errors = validate_step(step, &submission).err().unwrap_or_default();
    tracing::debug!(step = step.as_str(), failing = errors.len(), "Intake step validated");
    success(
        StepValidation {
            valid: errors.is_empty(),
            errors,
        },
        revision_id,
    )
}

/// POST /api/duplicates/check - Look for an existing lead or customer.
pub async fn check_duplicates(
    State(state): State<AppState>,
    Json(request): Json<DuplicateCheckRequest>,
) -> ApiResult<DuplicateCheck> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state
        .leads
        .check_duplicate(request.phone.as_deref(), request.email.as_deref())
        .await
    {
        Ok(warning) => success(DuplicateCheck { warning }, revision_id),
        Err(e) => error(e, revision_id),
    }
}
