//! Lead API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::models::{
    BulkManifest, BulkRequest, Lead, LeadRecord, LeadSubmission, UpdateAssignmentRequest,
    UpdateStatusRequest,
};
use crate::service::{AutoAssignOutcome, IntakeOutcome};
use crate::AppState;

/// GET /api/leads - List all leads, newest first.
pub async fn list_leads(State(state): State<AppState>) -> ApiResult<Vec<Lead>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.leads.list().await {
        Ok(leads) => success(leads, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/leads/:id - Get a lead with its transition log.
pub async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<LeadRecord> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.leads.get_record(&id).await {
        Ok(record) => success(record, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/leads - Submit the intake wizard.
pub async fn create_lead(
    State(state): State<AppState>,
    Json(submission): Json<LeadSubmission>,
) -> ApiResult<IntakeOutcome> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let settings = match state.repo.load_settings().await {
        Ok(settings) => settings,
        Err(e) => return error(e, revision_id),
    };

    match state.leads.intake(&submission, &settings).await {
        Ok(outcome) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(outcome, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/leads/:id/status - Move a lead through the pipeline.
pub async fn update_lead_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Lead> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let settings = match state.repo.load_settings().await {
        Ok(settings) => settings,
        Err(e) => return error(e, revision_id),
    };

    match state
        .leads
        .change_status(
            &id,
            request.status,
            request.actor.as_deref(),
            request.expected_version,
            settings.pipeline_mode,
        )
        .await
    {
        Ok(lead) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(lead, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/leads/:id/assignment - Assign a lead to a member, or unassign it.
pub async fn update_lead_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateAssignmentRequest>,
) -> ApiResult<Lead> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state
        .leads
        .assign(&id, request.member_id.as_deref(), request.expected_version)
        .await
    {
        Ok(lead) => {
            if let Some(actor) = request.actor.as_deref() {
                tracing::debug!(lead_id = %id, actor, "Manual assignment");
            }
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(lead, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/leads/:id/auto-assign - Run the configured assignment strategy.
pub async fn auto_assign_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<AutoAssignOutcome> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let settings = match state.repo.load_settings().await {
        Ok(settings) => settings,
        Err(e) => return error(e, revision_id),
    };

    match state.leads.auto_assign(&id, &settings).await {
        Ok(outcome) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(outcome, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/leads/:id/rescore - Recompute score and temperature.
pub async fn rescore_lead(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Lead> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let settings = match state.repo.load_settings().await {
        Ok(settings) => settings,
        Err(e) => return error(e, revision_id),
    };

    match state.leads.rescore(&id, &settings).await {
        Ok(lead) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(lead, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/leads/bulk - Apply one action to many leads.
pub async fn bulk_leads(
    State(state): State<AppState>,
    Json(request): Json<BulkRequest>,
) -> ApiResult<BulkManifest> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let settings = match state.repo.load_settings().await {
        Ok(settings) => settings,
        Err(e) => return error(e, revision_id),
    };

    match state.bulk.apply(&request, &settings).await {
        Ok(manifest) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(manifest, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
